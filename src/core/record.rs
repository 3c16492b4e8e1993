use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{datetime_to_millis, decimal_to_f64};
use crate::error::{ChartError, ChartResult};

pub const FIELD_OPEN: &str = "open";
pub const FIELD_HIGH: &str = "high";
pub const FIELD_LOW: &str = "low";
pub const FIELD_CLOSE: &str = "close";
pub const FIELD_VOLUME: &str = "volume";

/// One time-stamped row of numeric fields (a candle, a depth level, an
/// indicator sample...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub values: IndexMap<String, f64>,
}

impl Record {
    #[must_use]
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            values: IndexMap::new(),
        }
    }

    /// Convenience constructor for an OHLCV candle.
    #[must_use]
    pub fn candle(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self::new(time)
            .with_value(FIELD_OPEN, open)
            .with_value(FIELD_HIGH, high)
            .with_value(FIELD_LOW, low)
            .with_value(FIELD_CLOSE, close)
            .with_value(FIELD_VOLUME, volume)
    }

    #[must_use]
    pub fn with_value(mut self, field: impl Into<String>, value: f64) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Adds a field from an exact decimal price as delivered by data feeds.
    pub fn with_decimal(self, field: &str, value: Decimal) -> ChartResult<Self> {
        let value = decimal_to_f64(value, field)?;
        Ok(self.with_value(field, value))
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied().filter(|value| value.is_finite())
    }

    #[must_use]
    pub fn time_millis(&self) -> f64 {
        datetime_to_millis(self.time)
    }
}

/// Sorts records by time; for duplicate timestamps the later record wins.
#[must_use]
pub fn canonicalize_records(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|record| record.time);
    let mut canonical: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        match canonical.last_mut() {
            Some(last) if last.time == record.time => *last = record,
            _ => canonical.push(record),
        }
    }
    canonical
}

/// Realtime-update outcome for [`push_realtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeUpdate {
    Appended,
    ReplacedLatest,
}

/// Applies a streaming record:
/// - appends when `record.time` is newer than the latest record
/// - replaces the latest record when the timestamps are equal
/// - rejects out-of-order records
pub fn push_realtime(records: &mut Vec<Record>, record: Record) -> ChartResult<RealtimeUpdate> {
    match records.last_mut() {
        Some(last) if record.time < last.time => Err(ChartError::InvalidData(
            "record time must be >= latest record time".to_owned(),
        )),
        Some(last) if record.time == last.time => {
            *last = record;
            Ok(RealtimeUpdate::ReplacedLatest)
        }
        _ => {
            records.push(record);
            Ok(RealtimeUpdate::Appended)
        }
    }
}
