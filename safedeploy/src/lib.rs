//! Assembly and deployment of Gnosis Safe multisig wallets through the
//! proxy factory.
//!
//! Three pieces carry the flow: [`roster::SafeRoster`] holds the owner list
//! being edited, [`deploy::SafeDeployer`] drives the submit-and-confirm
//! flow against abstract ledger capabilities, and
//! [`workbench::SafeWorkbench`] owns both plus the deployed-proxy list
//! behind a single-writer surface.
#![forbid(unsafe_code)]

pub mod capabilities;
pub mod chains;
pub mod contracts;
pub mod deploy;
pub mod error;
pub mod gas;
pub mod query;
pub mod roster;
pub mod workbench;

pub use capabilities::{
    CallReceipt, ContractCall, EventFilter, FallbackHandler, MasterCopy, PendingCall,
    ProxyCreationEvent, ProxyFactory, Transactor,
};
pub use chains::{ChainProfiles, SafeContracts, SafeV111};
pub use contracts::SetupCall;
pub use deploy::{DeployReceipt, DeployStatus, SafeDeployer};
pub use error::{DeployError, QueryError, SubmitError};
pub use gas::{FixedGasOracle, GasOracle, GasSpeed};
pub use roster::{Owner, OwnerKey, RosterAction, RosterError, SafeRoster};
pub use workbench::SafeWorkbench;
