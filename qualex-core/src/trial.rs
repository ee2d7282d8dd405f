use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// Format of every timestamp column in a persisted row.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const UNKNOWN: &str = "Unknown";

/// One of the two binary actions available while a stimulus is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// The recorded outcome of a question slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Left,
    Right,
    #[serde(rename = "No answer")]
    NoAnswer,
}

impl From<Side> for Choice {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Choice::Left,
            Side::Right => Choice::Right,
        }
    }
}

impl From<Option<Side>> for Choice {
    fn from(side: Option<Side>) -> Self {
        side.map_or(Choice::NoAnswer, Choice::from)
    }
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::Left => "Left",
            Choice::Right => "Right",
            Choice::NoAnswer => "No answer",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recorded result per question slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub participant_id: ParticipantId,
    /// 1-based.
    pub question: u32,
    pub stimulus_index: Option<usize>,
    pub choice: Choice,
    pub elapsed_seconds: f64,
    pub session_start: NaiveDateTime,
}

impl TrialResult {
    /// Flattens the result into the persisted column layout, stamping it
    /// with the time the batch was written.
    pub fn to_record(&self, written_at: NaiveDateTime) -> ResponseRecord {
        ResponseRecord {
            timestamp: written_at.format(TIMESTAMP_FORMAT).to_string(),
            participant_id: self.participant_id.to_string(),
            question: self.question,
            video_index: self
                .stimulus_index
                .map_or_else(|| UNKNOWN.to_string(), |i| i.to_string()),
            choice: self.choice,
            time_used: self.elapsed_seconds.max(0.0),
            session_start: self.session_start.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// One persisted row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Participant_ID")]
    pub participant_id: String,
    #[serde(rename = "Question")]
    pub question: u32,
    #[serde(rename = "Video_Index")]
    pub video_index: String,
    #[serde(rename = "Choice")]
    pub choice: Choice,
    #[serde(rename = "TimeUsed")]
    pub time_used: f64,
    #[serde(rename = "Session_Start")]
    pub session_start: String,
}

impl ResponseRecord {
    pub const COLUMNS: [&'static str; 7] = [
        "Timestamp",
        "Participant_ID",
        "Question",
        "Video_Index",
        "Choice",
        "TimeUsed",
        "Session_Start",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn record_formats_every_column() {
        let result = TrialResult {
            participant_id: ParticipantId(17),
            question: 3,
            stimulus_index: Some(9),
            choice: Choice::Right,
            elapsed_seconds: 2.5,
            session_start: at(10, 0, 0),
        };
        let record = result.to_record(at(10, 4, 30));
        assert_eq!(record.timestamp, "2025-03-14 10:04:30");
        assert_eq!(record.participant_id, "17");
        assert_eq!(record.question, 3);
        assert_eq!(record.video_index, "9");
        assert_eq!(record.choice, Choice::Right);
        assert_eq!(record.time_used, 2.5);
        assert_eq!(record.session_start, "2025-03-14 10:00:00");
    }

    #[test]
    fn missing_values_serialize_as_placeholders() {
        let result = TrialResult {
            participant_id: ParticipantId(1),
            question: 12,
            stimulus_index: None,
            choice: Option::<Side>::None.into(),
            elapsed_seconds: -0.3,
            session_start: at(9, 0, 0),
        };
        let record = result.to_record(at(9, 1, 0));
        assert_eq!(record.video_index, "Unknown");
        assert_eq!(record.choice.as_str(), "No answer");
        assert_eq!(record.time_used, 0.0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Choice"], "No answer");
        assert_eq!(json["Participant_ID"], "1");
    }

    #[test]
    fn json_keys_follow_column_order() {
        let record = TrialResult {
            participant_id: ParticipantId(2),
            question: 1,
            stimulus_index: Some(0),
            choice: Choice::Left,
            elapsed_seconds: 1.0,
            session_start: at(8, 0, 0),
        }
        .to_record(at(8, 0, 1));
        let json = serde_json::to_string(&record).unwrap();
        let positions: Vec<usize> = ResponseRecord::COLUMNS
            .iter()
            .map(|c| json.find(&format!("\"{c}\"")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
