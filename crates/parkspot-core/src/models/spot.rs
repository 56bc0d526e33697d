use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpotKind {
    Parking,
    EvCharging,
}

impl SpotKind {
    /// Value of the `type` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            SpotKind::Parking => "PARKING",
            SpotKind::EvCharging => "EV_CHARGING",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Spot {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SpotKind,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "pricePerHour", default)]
    pub price_per_hour: Option<f64>,
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Booking {
    pub id: i64,
    #[serde(rename = "spotId")]
    pub spot_id: i64,
    #[serde(rename = "startTime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
}

impl Booking {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes().max(0)
    }
}
