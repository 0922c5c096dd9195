use serde::{Deserialize, Serialize};

/// How finalized a state read must be before the ledger answers it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Observed by the node, possibly still subject to rollback.
    Processed,
    /// Voted on by a supermajority.
    #[default]
    Confirmed,
    /// Rooted; cannot be rolled back.
    Finalized,
}
