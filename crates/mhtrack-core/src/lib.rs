//! Core library for mhtrack.
//!
//! Polls the Matkahuolto parcel tracking service and condenses the user's
//! shipments into a single sensor: the time of the latest status change plus
//! an ordered, filtered list of packages.
//!
//! - [`api`]: HTTP client with login and one-shot re-authentication
//! - [`auth`]: credentials and access token state
//! - [`models`]: raw shipments and normalized packages
//! - [`sensor`]: classification, ordering and the published sensor state

pub mod api;
pub mod auth;
pub mod models;
pub mod sensor;

pub use api::{ApiClient, ApiError, ClientSettings};
pub use auth::Credentials;
pub use models::{Package, PackageStatus, Shipment, ShipmentsResponse};
pub use sensor::{PackageSensor, SensorAttributes, SensorOptions, SensorState};
