pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock, seconds_between};
