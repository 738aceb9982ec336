//! Sensor readings shown beside the task list.
//!
//! Readings are replaced wholesale on each successful refresh; a failed
//! refresh leaves the previous reading in place.

use duewatch_backend::SensorPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One snapshot of the four sensor channels. Missing channels are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Light level in lumen.
    pub luminosity: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Particulate matter (PM2.5).
    pub particulates: f64,
}

impl From<SensorPayload> for SensorReading {
    fn from(payload: SensorPayload) -> Self {
        Self {
            temperature: payload.temperature,
            luminosity: payload.lumen,
            humidity: payload.humidity,
            particulates: payload.pm25,
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} °C | {:.0} lumen | {:.0} % | PM2.5 {:.1}",
            self.temperature, self.luminosity, self.humidity, self.particulates
        )
    }
}
