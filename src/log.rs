//! Append-only, time-ordered session logs with CSV export.

use chrono::{DateTime, Local, SecondsFormat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::error::{GestureError, Result};
use crate::labels::GestureLabel;
use crate::types::Prediction;

/// A log row: knows its timestamp and the CSV header for its fields.
pub trait Timestamped {
    const CSV_HEADER: &'static [&'static str];

    fn timestamp(&self) -> DateTime<Local>;
}

/// Entries are only ever appended or cleared all at once, and stay in timestamp order.
#[derive(Debug, Clone)]
pub struct AppendOnlyLog<T> {
    entries: Vec<T>,
}

impl<T> Default for AppendOnlyLog<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Timestamped> AppendOnlyLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects entries older than the newest one already logged.
    pub fn append(&mut self, entry: T) -> Result<()> {
        if let Some(last) = self.entries.last() {
            if entry.timestamp() < last.timestamp() {
                return Err(GestureError::OutOfOrder {
                    last: format_timestamp(&last.timestamp()),
                    incoming: format_timestamp(&entry.timestamp()),
                });
            }
        }
        self.entries.push(entry);
        debug!(len = self.entries.len(), "log entry appended");
        Ok(())
    }

    /// Current wall-clock time, never earlier than the last entry.
    pub fn next_timestamp(&self) -> DateTime<Local> {
        let now = Local::now();
        match self.entries.last() {
            Some(last) if last.timestamp() > now => last.timestamp(),
            _ => now,
        }
    }

    pub fn all(&self) -> &[T] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Header row followed by one row per entry, in log order.
    pub fn export_csv(&self) -> Result<Vec<u8>>
    where
        T: Serialize,
    {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        wtr.write_record(T::CSV_HEADER)?;
        for entry in &self.entries {
            wtr.serialize(entry)?;
        }
        wtr.into_inner()
            .map_err(|e| GestureError::Export(e.to_string()))
    }
}

/// Reads rows written by [`AppendOnlyLog::export_csv`].
pub fn parse_csv<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(data);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, false)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Local>, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<DateTime<Local>, D::Error> {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Local))
        .map_err(serde::de::Error::custom)
}

fn serialize_confidence<S: Serializer>(c: &f32, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{:.4}", c))
}

/// A prediction the user confirmed as correct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureObservation {
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub gesture: GestureLabel,
    #[serde(serialize_with = "serialize_confidence")]
    pub confidence: f32,
}

impl GestureObservation {
    pub fn new(timestamp: DateTime<Local>, gesture: GestureLabel, confidence: f32) -> Self {
        Self {
            timestamp,
            gesture,
            confidence,
        }
    }

    /// Same layout as the live overlay: `HH:MM:SS`.
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    pub fn display_confidence(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

impl Timestamped for GestureObservation {
    const CSV_HEADER: &'static [&'static str] = &["Timestamp", "Gesture", "Confidence"];

    fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

pub type ConfirmedGestureLog = AppendOnlyLog<GestureObservation>;

impl ConfirmedGestureLog {
    /// Logs a live prediction. Unknown predictions carry no label and are refused.
    pub fn confirm(&mut self, prediction: &Prediction) -> Option<&GestureObservation> {
        let label = prediction.label?;
        let obs = GestureObservation::new(self.next_timestamp(), label, prediction.confidence);
        self.append(obs).ok()?;
        self.entries.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackStatus {
    Incorrect,
}

/// A prediction the user flagged as wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
    pub predicted: GestureLabel,
    pub status: FeedbackStatus,
}

impl Timestamped for FeedbackEntry {
    const CSV_HEADER: &'static [&'static str] = &["Timestamp", "Predicted", "Status"];

    fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

pub type FeedbackLog = AppendOnlyLog<FeedbackEntry>;

impl FeedbackLog {
    pub fn mark_incorrect(&mut self, prediction: &Prediction) -> Option<&FeedbackEntry> {
        let predicted = prediction.label?;
        let entry = FeedbackEntry {
            timestamp: self.next_timestamp(),
            predicted,
            status: FeedbackStatus::Incorrect,
        };
        self.append(entry).ok()?;
        self.entries.last()
    }
}
