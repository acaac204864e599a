//! Package sensor: the published view of a user's shipments.
//!
//! `PackageSensor` owns an `ApiClient` and the last published `SensorState`.
//! Each `update` replaces the state wholesale from a fresh fetch. When the
//! fetch fails with a communication error the previous state is kept and
//! only `available` flips to false.

mod packages;

pub use packages::{age_in_days, build_snapshot, PackageSnapshot};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::Package;

/// Prefix of the sensor name and unique id; the username follows it.
pub const SENSOR_NAME_PREFIX: &str = "matkahuolto_";
pub const UNIT_OF_MEASUREMENT: &str = "packages";
pub const ICON: &str = "mdi:package";
pub const ATTRIBUTION: &str = "Data provided by Oy Matkahuolto Ab";

/// Display and filtering options, fixed when the sensor is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorOptions {
    /// Keep undelivered packages ahead of delivered ones.
    pub prioritize_undelivered: bool,
    /// Upper bound on the published package count.
    pub max_shipments: usize,
    /// Undelivered shipments idle for more days than this are hidden.
    pub stale_shipment_day_limit: u32,
    /// Delivered shipments are shown for this many days after delivery.
    pub completed_shipment_days_shown: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorAttributes {
    pub packages: Vec<Package>,
}

/// Everything a dashboard needs to render the sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub name: String,
    pub unique_id: String,
    pub available: bool,
    /// Latest status change across all shipments, unset until one is seen.
    pub state: Option<DateTime<Local>>,
    pub unit_of_measurement: String,
    pub icon: String,
    pub attribution: String,
    pub attributes: SensorAttributes,
}

impl SensorState {
    pub fn new(username: &str) -> Self {
        let id = format!("{}{}", SENSOR_NAME_PREFIX, username);
        Self {
            name: id.clone(),
            unique_id: id,
            available: true,
            state: None,
            unit_of_measurement: UNIT_OF_MEASUREMENT.to_string(),
            icon: ICON.to_string(),
            attribution: ATTRIBUTION.to_string(),
            attributes: SensorAttributes::default(),
        }
    }
}

pub struct PackageSensor {
    client: ApiClient,
    options: SensorOptions,
    state: SensorState,
}

impl PackageSensor {
    pub fn new(client: ApiClient, options: SensorOptions) -> Self {
        let state = SensorState::new(client.credentials().username());
        Self {
            client,
            options,
            state,
        }
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    /// Seed the published state from an earlier run. The restored snapshot
    /// counts as unavailable until a refresh succeeds.
    pub fn restore(&mut self, previous: SensorState) {
        if previous.unique_id != self.state.unique_id {
            warn!(
                expected = %self.state.unique_id,
                found = %previous.unique_id,
                "Ignoring snapshot for a different sensor"
            );
            return;
        }
        debug!(packages = previous.attributes.packages.len(), "Restored sensor snapshot");
        self.state.state = previous.state;
        self.state.attributes = previous.attributes;
        self.state.available = false;
    }

    /// Refresh from the API.
    ///
    /// Communication errors are absorbed into `available = false`; any other
    /// error is returned and leaves the state untouched.
    pub async fn update(&mut self) -> Result<&SensorState, ApiError> {
        match self.client.fetch_shipments().await {
            Ok(response) => {
                let snapshot = build_snapshot(&response.shipments, &self.options, Local::now());
                info!(
                    fetched = response.shipments.len(),
                    published = snapshot.packages.len(),
                    latest = ?snapshot.latest_change,
                    "Sensor updated"
                );
                self.state.available = true;
                self.state.state = snapshot.latest_change;
                self.state.attributes.packages = snapshot.packages;
                Ok(&self.state)
            }
            Err(e) if e.is_communication() => {
                warn!(error = %e, sensor = %self.state.unique_id, "Sensor unavailable");
                self.state.available = false;
                Ok(&self.state)
            }
            Err(e) => Err(e),
        }
    }
}
