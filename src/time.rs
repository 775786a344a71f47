//! # Time-lapse unit conversion
//!
//! Converts durations and time points between frames and wall-clock units.
//! A time-lapse movie has a fixed interval between frames; every conversion is
//! linear in that interval.
//!
//! ```rust
//! use cecog::time::{TimeConverter, TimeUnit};
//!
//! let conv = TimeConverter::new(300.0)?; // one frame every 5 minutes
//! assert_eq!(conv.convert(12.0, TimeUnit::Frames, TimeUnit::Hours), 1.0);
//! # Ok::<(), cecog::time::TimeError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur while setting up or parsing time units
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    /// Frame interval is zero, negative or not finite
    #[error("Invalid time-lapse interval: {0} s")]
    InvalidTimelapse(f64),

    /// Unrecognised unit name
    #[error("Unknown time unit: {0}")]
    UnknownUnit(String),
}

/// Units a time value can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Frame index / frame count
    Frames,
    /// Seconds
    Seconds,
    /// Minutes
    Minutes,
    /// Hours
    Hours,
}

impl TimeUnit {
    /// All units, in display order
    pub const ALL: [TimeUnit; 4] = [
        TimeUnit::Frames,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
    ];

    /// Seconds per unit, `None` for frames
    fn seconds_per_unit(&self) -> Option<f64> {
        match self {
            TimeUnit::Frames => None,
            TimeUnit::Seconds => Some(1.0),
            TimeUnit::Minutes => Some(60.0),
            TimeUnit::Hours => Some(3600.0),
        }
    }

    /// Short axis label, e.g. `min`
    pub fn abbreviation(&self) -> &'static str {
        match self {
            TimeUnit::Frames => "frames",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Frames => "frames",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        };
        f.write_str(name)
    }
}

impl FromStr for TimeUnit {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frames" | "frame" | "f" => Ok(TimeUnit::Frames),
            "seconds" | "second" | "sec" | "s" => Ok(TimeUnit::Seconds),
            "minutes" | "minute" | "min" | "m" => Ok(TimeUnit::Minutes),
            "hours" | "hour" | "h" => Ok(TimeUnit::Hours),
            _ => Err(TimeError::UnknownUnit(s.to_string())),
        }
    }
}

/// Converts values between [`TimeUnit`]s for a fixed frame interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeConverter {
    timelapse: f64,
}

impl TimeConverter {
    /// Create a converter for a movie with `timelapse_seconds` between frames
    pub fn new(timelapse_seconds: f64) -> Result<Self, TimeError> {
        if !timelapse_seconds.is_finite() || timelapse_seconds <= 0.0 {
            return Err(TimeError::InvalidTimelapse(timelapse_seconds));
        }
        Ok(Self {
            timelapse: timelapse_seconds,
        })
    }

    /// Seconds between two consecutive frames
    pub fn timelapse(&self) -> f64 {
        self.timelapse
    }

    /// Express `value` (in `unit`) in seconds
    pub fn to_seconds(&self, value: f64, unit: TimeUnit) -> f64 {
        match unit.seconds_per_unit() {
            Some(factor) => value * factor,
            None => value * self.timelapse,
        }
    }

    /// Express `seconds` in `unit`
    pub fn from_seconds(&self, seconds: f64, unit: TimeUnit) -> f64 {
        match unit.seconds_per_unit() {
            Some(factor) => seconds / factor,
            None => seconds / self.timelapse,
        }
    }

    /// Convert `value` from one unit to another
    pub fn convert(&self, value: f64, from: TimeUnit, to: TimeUnit) -> f64 {
        if from == to {
            return value;
        }
        self.from_seconds(self.to_seconds(value, from), to)
    }

    /// Nearest frame index for a time point given in seconds
    pub fn frame_at(&self, seconds: f64) -> i64 {
        (seconds / self.timelapse).round() as i64
    }

    /// Convert a whole series, e.g. an x-axis of frame indices
    pub fn convert_all(&self, values: &[f64], from: TimeUnit, to: TimeUnit) -> Vec<f64> {
        values.iter().map(|&v| self.convert(v, from, to)).collect()
    }
}
