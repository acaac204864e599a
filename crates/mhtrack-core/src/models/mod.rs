//! Data models for Matkahuolto shipments.
//!
//! - `Shipment`, `ShipmentsResponse`: raw records as returned by the API
//! - `Package`, `PackageStatus`: the normalized form published by the sensor
//!
//! Timestamps are normalized to `DateTime<Local>` while deserializing.

pub mod package;
pub mod shipment;
pub mod time;

pub use package::{Package, PackageStatus, EVENT_COUNTRY, PACKAGE_SOURCE};
pub use shipment::{LastEvent, Shipment, ShipmentsResponse};
pub use time::ServerTime;
