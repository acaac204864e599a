use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::Shipment;

/// Country reported for every event; the provider only operates in Finland.
pub const EVENT_COUNTRY: &str = "FI";

/// Source label attached to every package.
pub const PACKAGE_SOURCE: &str = "Matkahuolto";

/// Normalized shipment status, collapsed from the provider's raw code.
///
/// The integer codes are part of the published attribute format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PackageStatus {
    Delivered,
    Waiting,
    Received,
    InTransport,
    InDelivery,
    ReadyForPickup,
}

impl PackageStatus {
    /// Classify a raw provider status code.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            r if r >= 60 => PackageStatus::Delivered,
            r if r >= 50 => PackageStatus::ReadyForPickup,
            r if r >= 40 => PackageStatus::InDelivery,
            r if r >= 30 => PackageStatus::InTransport,
            r if r >= 20 => PackageStatus::Received,
            _ => PackageStatus::Waiting,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            PackageStatus::Delivered => 0,
            PackageStatus::Waiting => 1,
            PackageStatus::Received => 2,
            PackageStatus::InTransport => 3,
            PackageStatus::InDelivery => 4,
            PackageStatus::ReadyForPickup => 5,
        }
    }

    pub fn is_delivered(self) -> bool {
        self == PackageStatus::Delivered
    }
}

impl From<PackageStatus> for u8 {
    fn from(status: PackageStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for PackageStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PackageStatus::Delivered),
            1 => Ok(PackageStatus::Waiting),
            2 => Ok(PackageStatus::Received),
            3 => Ok(PackageStatus::InTransport),
            4 => Ok(PackageStatus::InDelivery),
            5 => Ok(PackageStatus::ReadyForPickup),
            other => Err(format!("unknown package status code {}", other)),
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageStatus::Delivered => write!(f, "Delivered"),
            PackageStatus::Waiting => write!(f, "Waiting"),
            PackageStatus::Received => write!(f, "Received"),
            PackageStatus::InTransport => write!(f, "In Transport"),
            PackageStatus::InDelivery => write!(f, "In Delivery"),
            PackageStatus::ReadyForPickup => write!(f, "Ready for Pickup"),
        }
    }
}

/// A shipment as published in the sensor's package list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub origin: Option<String>,
    pub origin_city: Option<String>,
    pub destination: Option<String>,
    pub destination_city: Option<String>,
    pub shipment_number: String,
    pub shipment_date: Option<DateTime<Local>>,
    pub status: PackageStatus,
    pub raw_status: i64,
    pub latest_event: Option<String>,
    pub latest_event_city: Option<String>,
    pub latest_event_country: String,
    /// Event time exactly as the server sent it.
    pub latest_event_date: String,
    pub source: String,
}

impl Package {
    /// Build the published record. Shipments known only by their delivery
    /// time report `last_status_change` in RFC 3339 as their event date.
    pub fn from_shipment(
        shipment: &Shipment,
        status: PackageStatus,
        last_status_change: DateTime<Local>,
    ) -> Self {
        let event = shipment.last_event.as_ref();
        Self {
            origin: shipment.sender_name.clone(),
            origin_city: shipment.sender_city.clone(),
            destination: shipment.destination_place_name.clone(),
            destination_city: shipment.receiver_city.clone(),
            shipment_number: shipment.shipment_number.clone(),
            shipment_date: shipment.shipment_date,
            status,
            raw_status: shipment.shipment_status,
            latest_event: event.and_then(|e| e.description.clone()),
            latest_event_city: event.and_then(|e| e.place.clone()),
            latest_event_country: EVENT_COUNTRY.to_string(),
            latest_event_date: event
                .map(|e| e.time.raw.clone())
                .unwrap_or_else(|| last_status_change.to_rfc3339()),
            source: PACKAGE_SOURCE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        let cases = [
            (19, PackageStatus::Waiting),
            (20, PackageStatus::Received),
            (29, PackageStatus::Received),
            (30, PackageStatus::InTransport),
            (39, PackageStatus::InTransport),
            (40, PackageStatus::InDelivery),
            (49, PackageStatus::InDelivery),
            (50, PackageStatus::ReadyForPickup),
            (59, PackageStatus::ReadyForPickup),
            (60, PackageStatus::Delivered),
            (61, PackageStatus::Delivered),
        ];
        for (raw, expected) in cases {
            assert_eq!(PackageStatus::from_raw(raw), expected, "raw status {}", raw);
        }
    }

    #[test]
    fn test_classification_codes() {
        assert_eq!(PackageStatus::from_raw(65).code(), 0);
        assert_eq!(PackageStatus::from_raw(55).code(), 5);
        assert_eq!(PackageStatus::from_raw(45).code(), 4);
        assert_eq!(PackageStatus::from_raw(35).code(), 3);
        assert_eq!(PackageStatus::from_raw(25).code(), 2);
        assert_eq!(PackageStatus::from_raw(0).code(), 1);
        assert_eq!(PackageStatus::from_raw(-5).code(), 1);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PackageStatus::ReadyForPickup.to_string(), "Ready for Pickup");
        assert_eq!(PackageStatus::from_raw(33).to_string(), "In Transport");
    }

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&PackageStatus::ReadyForPickup).expect("serializes");
        assert_eq!(json, "5");
        let back: PackageStatus = serde_json::from_str("0").expect("deserializes");
        assert_eq!(back, PackageStatus::Delivered);
        assert!(serde_json::from_str::<PackageStatus>("9").is_err());
    }

    #[test]
    fn test_package_from_delivery_only_shipment() {
        let json = r#"{"senderName":"Shop","shipmentNumber":"A1","shipmentStatus":60,"deliveryTime":1700000000000}"#;
        let shipment: Shipment = serde_json::from_str(json).expect("parses");
        let changed = shipment.last_status_change().expect("delivery time");
        let package = Package::from_shipment(&shipment, PackageStatus::Delivered, changed);

        assert_eq!(package.origin.as_deref(), Some("Shop"));
        assert_eq!(package.latest_event, None);
        assert_eq!(package.latest_event_date, changed.to_rfc3339());
        assert_eq!(package.latest_event_country, "FI");
        assert_eq!(package.source, "Matkahuolto");
    }

    #[test]
    fn test_package_attribute_keys() {
        let json = r#"{"shipmentNumber":"A1","shipmentStatus":25,"shipmentDate":1700000000000,
            "lastEvent":{"description":"Vastaanotettu","place":"OULU","time":"2023-11-14T10:00:00"}}"#;
        let shipment: Shipment = serde_json::from_str(json).expect("parses");
        let changed = shipment.last_status_change().expect("event time");
        let package = Package::from_shipment(&shipment, PackageStatus::from_raw(25), changed);

        let value = serde_json::to_value(&package).expect("serializes");
        let obj = value.as_object().expect("object");
        for key in [
            "origin",
            "origin_city",
            "destination",
            "destination_city",
            "shipment_number",
            "shipment_date",
            "status",
            "raw_status",
            "latest_event",
            "latest_event_city",
            "latest_event_country",
            "latest_event_date",
            "source",
        ] {
            assert!(obj.contains_key(key), "missing key {}", key);
        }
        assert_eq!(obj["status"], 2);
        assert_eq!(obj["raw_status"], 25);
        assert_eq!(obj["latest_event_city"], "OULU");
        assert_eq!(obj["latest_event_date"], "2023-11-14T10:00:00");
    }
}
