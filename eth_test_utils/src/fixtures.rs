use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use safedeploy::deploy::{DeployReceipt, SafeDeployer};
use safedeploy::gas::FixedGasOracle;
use safedeploy::workbench::SafeWorkbench;

use crate::capabilities::{SimFactory, SimFallbackHandler, SimMasterCopy, SimTransactor};
use crate::ledger::{SimLedger, SimLedgerConfig};

/// Deterministic 20-byte address for tests
pub fn test_address(tag: u8) -> Address {
    Address::repeat_byte(tag)
}

/// A workbench wired to a fresh simulated ledger, plus the ledger handle
/// for fault injection and call counters.
pub struct SafeFixture {
    pub ledger: Arc<SimLedger>,
    pub workbench: SafeWorkbench,
}

impl SafeFixture {
    /// Fixture with the default ledger configuration.
    pub fn bootstrap() -> Self {
        Self::with_config(SimLedgerConfig::default())
    }

    pub fn with_config(config: SimLedgerConfig) -> Self {
        let ledger = Arc::new(SimLedger::new(config.clone()));
        let deployer = SafeDeployer::new()
            .with_transactor(Arc::new(SimTransactor::new(ledger.clone())))
            .with_master_copy(Arc::new(SimMasterCopy::new(config.master_copy)))
            .with_proxy_factory(Arc::new(SimFactory::new(ledger.clone())))
            .with_fallback_handler(Arc::new(SimFallbackHandler::new(config.fallback_handler)))
            .with_gas_oracle(Arc::new(FixedGasOracle::gwei_defaults()));
        let workbench = SafeWorkbench::new(config.deployer.to_string(), deployer);
        SafeFixture { ledger, workbench }
    }
}

/// Deploy through the workbench, wrapping any failure with context.
pub async fn deploy_and_confirm(workbench: &mut SafeWorkbench) -> Result<DeployReceipt> {
    let receipt = workbench
        .deploy()
        .await
        .context("safe deployment failed")?;
    Ok(receipt)
}
