// Synthetic data generator domain models
use serde::{Deserialize, Serialize};
use std::fmt;

/// Four probabilities in a fixed category order.
///
/// Class vectors follow car, motorcycle, pedestrian, bicycle; approach
/// vectors follow NB, SB, WB, EB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbabilityVector(pub [f64; 4]);

impl ProbabilityVector {
    pub fn new(values: [f64; 4]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; 4] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub counts_rate: f64,
    pub approach_prob: ProbabilityVector,
    pub class_prob: ProbabilityVector,
    pub downtime_prob: f64,
}

/// Last status reported by the generator service. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorStatus {
    pub running: bool,
    #[serde(default)]
    pub config: Option<GeneratorConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

impl RunState {
    pub fn from_running(running: bool) -> Self {
        if running {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => f.write_str("stopped"),
            RunState::Running => f.write_str("running"),
        }
    }
}
