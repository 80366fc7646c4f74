use serde::{Deserialize, Serialize};

/// Orthogonal switches over the single request pipeline.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeatureToggles {
    #[serde(default = "default_true")]
    pub transfer_relay: bool,

    #[serde(default = "default_true")]
    pub mx_synthesis: bool,

    #[serde(default = "default_true")]
    pub reverse_auto_routing: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            transfer_relay: true,
            mx_synthesis: true,
            reverse_auto_routing: true,
        }
    }
}

fn default_true() -> bool {
    true
}
