use chrono::{DateTime, Local};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::time::{self, ServerTime};

/// Body of the shipments endpoint.
///
/// Records with neither a last event nor a delivery time are dropped while
/// decoding, whatever else they contain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentsResponse {
    #[serde(default, deserialize_with = "timed_shipments")]
    pub shipments: Vec<Shipment>,
}

/// One tracked parcel as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_city: Option<String>,
    #[serde(default)]
    pub destination_place_name: Option<String>,
    #[serde(default)]
    pub receiver_city: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub shipment_number: String,
    #[serde(default, deserialize_with = "time::option_epoch_millis")]
    pub shipment_date: Option<DateTime<Local>>,
    #[serde(deserialize_with = "status_code")]
    pub shipment_status: i64,
    #[serde(default)]
    pub last_event: Option<LastEvent>,
    #[serde(default, deserialize_with = "time::option_epoch_millis_truncated")]
    pub delivery_time: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastEvent {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    pub time: ServerTime,
}

impl Shipment {
    /// Time of the most recent event, or the delivery time when the provider
    /// reports no events. `None` means the shipment cannot be placed in time.
    pub fn last_status_change(&self) -> Option<DateTime<Local>> {
        self.last_event
            .as_ref()
            .map(|event| event.time.local)
            .or(self.delivery_time)
    }
}

fn has_time(record: &Value) -> bool {
    let present = |key: &str| record.get(key).is_some_and(|v| !v.is_null());
    present("lastEvent") || present("deliveryTime")
}

fn timed_shipments<'de, D>(deserializer: D) -> Result<Vec<Shipment>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Vec::<Value>::deserialize(deserializer)?;
    let mut shipments = Vec::with_capacity(records.len());
    for record in records {
        if !has_time(&record) {
            debug!(
                shipment = %record.get("shipmentNumber").unwrap_or(&serde_json::Value::Null),
                "Skipping shipment without event or delivery time"
            );
            continue;
        }
        shipments.push(Shipment::deserialize(record).map_err(de::Error::custom)?);
    }
    Ok(shipments)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Int(i64),
}

fn status_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Int(n) => Ok(n),
        StringOrNumber::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid shipment status: {}", s))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Int(n) => n.to_string(),
    })
}
