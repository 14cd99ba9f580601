pub mod assertions;
pub mod capabilities;
pub mod fixtures;
pub mod ledger;

pub use assertions::RosterAssertions;
pub use capabilities::{SimFactory, SimFallbackHandler, SimMasterCopy, SimTransactor};
pub use fixtures::{deploy_and_confirm, test_address, SafeFixture};
pub use ledger::{SimLedger, SimLedgerConfig};

pub mod prelude {
    pub use crate::assertions::RosterAssertions;
    pub use crate::capabilities::{SimFactory, SimFallbackHandler, SimMasterCopy, SimTransactor};
    pub use crate::fixtures::{deploy_and_confirm, test_address, SafeFixture};
    pub use crate::ledger::{SimLedger, SimLedgerConfig};
}
