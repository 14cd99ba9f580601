use alloy_primitives::TxHash;
use thiserror::Error;

/// Rejection raised by the signer or the ledger for a submitted call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The signer, or the node it fronts, refused the submission before it
    /// reached the ledger. User cancellation lands here.
    #[error("Submission rejected: {reason}")]
    Rejected { reason: String },
    /// The transaction was mined but execution reverted.
    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: TxHash, reason: String },
}

/// Failure while fetching historical event logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Event log fetch failed: {reason}")]
    FetchFailed { reason: String },
}

/// Failures of the deployment flow itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    /// A required capability is not wired. Checked before any ledger
    /// interaction, so a deployment failing this way made no submission.
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),
    /// An owner row holds a string that does not parse as an address.
    #[error("Owner address {address:?} is not a valid address")]
    InvalidOwnerAddress { address: String },
    #[error(transparent)]
    Submission(#[from] SubmitError),
}
