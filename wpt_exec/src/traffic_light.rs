//! # Traffic light states
//!
//! Maps the integer traffic light state codes received from the perception
//! system onto labels.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// State of a traffic light.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficLightState {
    Red,
    Yellow,
    Green,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrafficLightError {
    /// The code is not one of the known states. Codes other than 0 to 3,
    /// including 4, are never mapped.
    #[error("Traffic light state code {0} does not map to a known state")]
    UnmappedState(i32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrafficLightState {
    /// Upper case label of this state
    pub fn label(&self) -> &'static str {
        match self {
            TrafficLightState::Red => "RED",
            TrafficLightState::Yellow => "YELLOW",
            TrafficLightState::Green => "GREEN",
            TrafficLightState::Unknown => "UNKNOWN",
        }
    }
}

impl TryFrom<i32> for TrafficLightState {
    type Error = TrafficLightError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TrafficLightState::Red),
            1 => Ok(TrafficLightState::Yellow),
            2 => Ok(TrafficLightState::Green),
            3 => Ok(TrafficLightState::Unknown),
            c => Err(TrafficLightError::UnmappedState(c)),
        }
    }
}

impl fmt::Display for TrafficLightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the label for a traffic light state code.
pub fn traffic_light_label(code: i32) -> Result<&'static str, TrafficLightError> {
    TrafficLightState::try_from(code).map(|s| s.label())
}
