use serde::{Deserialize, Serialize};

/// Which human position the delivery leg of a key request aims for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Use the human's cell at the moment the request is processed.
    #[default]
    FreezeAtRequest,
    /// Use the cell the human reaches after the run of `Move` instructions
    /// immediately following the request.
    FollowScriptedMoves,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub delivery_policy: DeliveryPolicy,
}

impl SimulationConfig {
    pub fn with_delivery_policy(mut self, policy: DeliveryPolicy) -> Self {
        self.delivery_policy = policy;
        self
    }
}
