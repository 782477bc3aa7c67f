// Wire types exchanged between controller and workers

mod validation;

pub use validation::ValidationError;

use crate::sim::{Heading, Light};
use serde::{Deserialize, Serialize};

/// Position and heading of one vehicle, as reported by its zone
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub direction: Heading,
}

/// Position and state of a zone's signal
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalState {
    pub x: f64,
    pub y: f64,
    pub state: Light,
}

/// A zone's vehicles and signal at one point in time.
///
/// Replaced wholesale by the next report; never merged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    #[serde(default)]
    pub entities: Vec<VehicleState>,
    #[serde(default)]
    pub signal: Option<SignalState>,
}

/// Worker → Controller: register (or re-register) a zone
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub instance_id: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require("zone", &self.zone)?;
        validation::require("address", &self.address)?;
        validation::require("instance_id", &self.instance_id)?;
        Ok(())
    }
}

/// Worker → Controller: result of one local step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub entities: Vec<VehicleState>,
    #[serde(default)]
    pub signal: Option<SignalState>,
}

impl ReportRequest {
    pub fn new(zone: &str, instance_id: &str, snapshot: ZoneSnapshot) -> Self {
        Self {
            zone: zone.to_string(),
            count: Some(snapshot.entities.len()),
            instance_id: instance_id.to_string(),
            entities: snapshot.entities,
            signal: snapshot.signal,
        }
    }

    /// Checks required fields and returns the reported count
    pub fn validate(&self) -> Result<usize, ValidationError> {
        validation::require("zone", &self.zone)?;
        validation::require("instance_id", &self.instance_id)?;
        self.count.ok_or(ValidationError::MissingField("count"))
    }

    pub fn into_snapshot(self) -> ZoneSnapshot {
        ZoneSnapshot {
            entities: self.entities,
            signal: self.signal,
        }
    }
}

/// Controller → Worker: advance one step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepCommand {
    pub step_number: u64,
    pub controller_id: String,
}

/// Worker → Controller: step acknowledgement
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepAck {
    pub status: String,
    pub instance_id: String,
}

impl StepAck {
    pub fn acknowledged(instance_id: &str) -> Self {
        Self {
            status: "acknowledged".to_string(),
            instance_id: instance_id.to_string(),
        }
    }
}

/// Generic success body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Generic error body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_missing_field_rejected() {
        let req: RegisterRequest =
            serde_json::from_value(json!({"zone": "North", "address": "http://w:1"})).unwrap();
        assert_eq!(
            req.validate(),
            Err(ValidationError::MissingField("instance_id"))
        );
    }

    #[test]
    fn test_register_empty_field_rejected() {
        let req: RegisterRequest = serde_json::from_value(
            json!({"zone": "", "address": "http://w:1", "instance_id": "a"}),
        )
        .unwrap();
        assert_eq!(req.validate(), Err(ValidationError::MissingField("zone")));
    }

    #[test]
    fn test_report_requires_count() {
        let req: ReportRequest =
            serde_json::from_value(json!({"zone": "North", "instance_id": "a"})).unwrap();
        assert_eq!(req.validate(), Err(ValidationError::MissingField("count")));
    }

    #[test]
    fn test_report_accepts_zero_count() {
        let req: ReportRequest = serde_json::from_value(
            json!({"zone": "North", "instance_id": "a", "count": 0}),
        )
        .unwrap();
        assert_eq!(req.validate(), Ok(0));
        assert!(req.into_snapshot().entities.is_empty());
    }

    #[test]
    fn test_report_wire_format() {
        let snapshot = ZoneSnapshot {
            entities: vec![VehicleState {
                id: "North-car-0".to_string(),
                x: 1.0,
                y: 97.5,
                direction: Heading::East,
            }],
            signal: Some(SignalState {
                x: 100.0,
                y: 100.0,
                state: Light::Go,
            }),
        };

        let value = serde_json::to_value(ReportRequest::new("North", "w-1", snapshot)).unwrap();

        assert_eq!(value["zone"], "North");
        assert_eq!(value["count"], 1);
        assert_eq!(value["instance_id"], "w-1");
        assert_eq!(value["entities"][0]["direction"], "E");
        assert_eq!(value["signal"]["state"], "go");
    }
}
