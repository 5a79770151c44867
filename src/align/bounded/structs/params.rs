use serde::{Deserialize, Serialize};

/// Tunables for the anti-diagonal cloud search.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CloudSearchParams {
    /// X-drop: cells scoring more than `alpha` nats below the running
    /// maximum are pruned.
    pub alpha: f32,
    /// Symmetric padding, in cells, added around the surviving interval.
    pub beta: usize,
    /// Number of free anti-diagonals before pruning engages.
    pub gamma: usize,
}

impl Default for CloudSearchParams {
    fn default() -> Self {
        Self {
            alpha: 12.0,
            beta: 20,
            gamma: 5,
        }
    }
}
