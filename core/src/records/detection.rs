use crate::prelude::Position;
use crate::records::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::f64::consts::PI;

/// Waggle detection as written by the WDD into its per-waggle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(deserialize_with = "waggle_id_text")]
    pub waggle_id: String,
    #[serde(deserialize_with = "timestamp_text")]
    pub timestamp_begin: DateTime<Utc>,
    pub roi_center: Position,
    /// Radians.
    pub waggle_angle: f64,
    /// Seconds.
    pub waggle_duration: f64,
}

impl DetectionRecord {
    /// Waggle angle in degrees, wrapped into `[0, 360)`.
    pub fn waggle_angle_deg(&self) -> f64 {
        (self.waggle_angle / PI * 180.0).rem_euclid(360.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WaggleIdRepr {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

fn waggle_id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match WaggleIdRepr::deserialize(deserializer)? {
        WaggleIdRepr::Text(text) => text,
        WaggleIdRepr::Signed(value) => value.to_string(),
        WaggleIdRepr::Unsigned(value) => value.to_string(),
    })
}

fn timestamp_text<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(serde::de::Error::custom)
}
