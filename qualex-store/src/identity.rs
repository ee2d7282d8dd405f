use lazy_static::lazy_static;
use qualex_core::{IdentitySource, ParticipantId, StoreError};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

lazy_static! {
    /// One in-process lock per counter path.
    static ref COUNTER_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> = Mutex::new(HashMap::new());
}

fn lock_for(path: &Path) -> Result<Arc<Mutex<()>>, StoreError> {
    let mut locks = COUNTER_LOCKS
        .lock()
        .map_err(|_| StoreError::Unavailable("counter lock registry poisoned".to_string()))?;
    Ok(locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone())
}

/// Interprets stored counter text. Empty or malformed contents count as zero.
fn parse_counter(text: &str) -> u64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }
    match trimmed.parse::<u64>() {
        Ok(value) => value,
        Err(e) => {
            warn!(value = trimmed, error = %e, "malformed participant counter, restarting from 0");
            0
        }
    }
}

/// Exclusive marker file held for the duration of a read-increment-write.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf, attempts: u32, delay: Duration) -> Result<Self, StoreError> {
        for attempt in 0..attempts.max(1) {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(attempt, lock = %path.display(), "counter locked, retrying");
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e.into()),
            }
        }
        let age = lock_age(&path)
            .map(|age| format!("{}s old", age.as_secs()))
            .unwrap_or_else(|| "age unknown".to_string());
        warn!(
            lock = %path.display(),
            %age,
            attempts,
            "counter lock never released, remove it if no session is running"
        );
        Err(StoreError::Unavailable(format!(
            "counter lock {} is held by another process ({age})",
            path.display()
        )))
    }
}

/// Time since the lock file was last modified.
fn lock_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    SystemTime::now().duration_since(modified).ok()
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "could not release counter lock");
        }
    }
}

/// Participant counter persisted as decimal text in a file.
///
/// Allocation is serialized within the process by a per-path mutex and
/// across processes by a `<counter>.lock` file.
#[derive(Debug, Clone)]
pub struct CounterFile {
    path: PathBuf,
    lock_attempts: u32,
    retry_delay: Duration,
}

impl CounterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_attempts: 50,
            retry_delay: Duration::from_millis(20),
        }
    }

    pub fn with_lock_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.lock_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Last allocated id, creating the counter at zero if it does not exist.
    pub fn current(&self) -> Result<u64, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_counter(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.write_value(0)?;
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_value(&self, value: u64) -> Result<(), StoreError> {
        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        {
            let mut file = fs::File::create(&tmp)?;
            write!(file, "{value}")?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl IdentitySource for CounterFile {
    fn allocate(&self) -> Result<ParticipantId, StoreError> {
        let local = lock_for(&self.path)?;
        let _local = local
            .lock()
            .map_err(|_| StoreError::Unavailable("counter lock poisoned".to_string()))?;
        let _file = LockFile::acquire(self.lock_path(), self.lock_attempts, self.retry_delay)?;

        let next = self.current()?.checked_add(1).ok_or_else(|| StoreError::Malformed {
            what: "participant counter",
            detail: "counter overflowed".to_string(),
        })?;
        self.write_value(next)?;
        debug!(counter = %self.path.display(), id = next, "participant id allocated");
        Ok(ParticipantId(next))
    }
}

/// In-process counter. Ids start at `start + 1`.
#[derive(Debug, Default)]
pub struct MemoryCounter {
    last: AtomicU64,
}

impl MemoryCounter {
    pub fn new(start: u64) -> Self {
        Self {
            last: AtomicU64::new(start),
        }
    }

    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl IdentitySource for MemoryCounter {
    fn allocate(&self) -> Result<ParticipantId, StoreError> {
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_add(1))
            .map_err(|_| StoreError::Malformed {
                what: "participant counter",
                detail: "counter overflowed".to_string(),
            })?;
        Ok(ParticipantId(prev + 1))
    }
}
