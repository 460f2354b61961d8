use std::fmt;

use serde::{Deserialize, Serialize};

/// Sampling temperature, always within `[Temperature::MIN, Temperature::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Temperature(f32);

impl Temperature {
    /// Lowest accepted temperature.
    pub const MIN: f32 = 0.0;
    /// Highest accepted temperature.
    pub const MAX: f32 = 1.0;
    /// Increment used by `/temperature up` and `/temperature down`.
    pub const STEP: f32 = 0.1;
    /// Temperature of a freshly initialized session.
    pub const DEFAULT: f32 = 0.7;

    /// Clamps `value` into range.  Non-finite input yields the default.
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(Self::MIN, Self::MAX))
        } else {
            Self(Self::DEFAULT)
        }
    }

    /// The raw value.
    pub fn value(&self) -> f32 {
        self.0
    }

    /// One step warmer, clamped.
    pub fn step_up(&self) -> Self {
        Self::new(round_to_step(self.0) + Self::STEP)
    }

    /// One step cooler, clamped.
    pub fn step_down(&self) -> Self {
        Self::new(round_to_step(self.0) - Self::STEP)
    }
}

// Keeps repeated steps from accumulating float error (0.7 + 0.1 + 0.1 ...).
fn round_to_step(value: f32) -> f32 {
    (value / Temperature::STEP).round() * Temperature::STEP
}

impl Default for Temperature {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<f32> for Temperature {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<f64> for Temperature {
    fn from(value: f64) -> Self {
        Self::new(value as f32)
    }
}

impl From<Temperature> for f32 {
    fn from(value: Temperature) -> Self {
        value.0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}
