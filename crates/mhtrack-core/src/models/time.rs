//! Normalization of the provider's two timestamp forms into `DateTime<Local>`.
//!
//! Event times arrive as ISO-8601 strings, usually without an offset, and
//! are read as local wall-clock time. Shipment and delivery dates arrive as
//! epoch milliseconds.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{de, Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an event time string. Strings with an explicit offset are converted
/// to the local zone; naive strings are taken as local time.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())?;
    // Ambiguous wall-clock times (DST fold) resolve to the earlier instant
    Local.from_local_datetime(&naive).earliest()
}

pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(millis).single()
}

/// Epoch millis truncated to whole seconds, as delivery times are compared.
pub fn from_epoch_millis_truncated(millis: i64) -> Option<DateTime<Local>> {
    Local.timestamp_opt(millis / 1000, 0).single()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Text(String),
    Millis(i64),
}

impl RawTime {
    fn into_local(self) -> Option<DateTime<Local>> {
        match self {
            RawTime::Text(s) => parse_event_time(&s),
            RawTime::Millis(ms) => from_epoch_millis(ms),
        }
    }
}

/// An event time as the server sent it, together with its local instant.
///
/// The raw text is what gets published; the instant is used for ordering
/// and age checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTime {
    pub raw: String,
    pub local: DateTime<Local>,
}

impl From<DateTime<Local>> for ServerTime {
    fn from(local: DateTime<Local>) -> Self {
        Self {
            raw: local.format("%Y-%m-%dT%H:%M:%S").to_string(),
            local,
        }
    }
}

impl<'de> Deserialize<'de> for ServerTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawTime::deserialize(deserializer)?;
        let text = match &raw {
            RawTime::Text(s) => s.clone(),
            RawTime::Millis(ms) => ms.to_string(),
        };
        match raw.into_local() {
            Some(local) => Ok(ServerTime { raw: text, local }),
            None => Err(de::Error::custom(format!("invalid event time: {}", text))),
        }
    }
}

pub(crate) fn option_epoch_millis<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Local>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        Some(ms) => from_epoch_millis(ms)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("epoch millis out of range: {}", ms))),
        None => Ok(None),
    }
}

pub(crate) fn option_epoch_millis_truncated<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Local>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        Some(ms) => from_epoch_millis_truncated(ms)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("epoch millis out of range: {}", ms))),
        None => Ok(None),
    }
}
