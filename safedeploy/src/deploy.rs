use std::sync::Arc;

use alloy_primitives::utils::format_units;
use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::capabilities::{CallReceipt, FallbackHandler, MasterCopy, ProxyFactory, Transactor};
use crate::contracts::SetupCall;
use crate::error::DeployError;
use crate::gas::{GasOracle, GasSpeed};
use crate::roster::SafeRoster;

/// Observable state of the deployment flow. Terminal states persist until
/// the next deployment attempt overwrites them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployStatus {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Confirmed,
    Failed { message: String },
}

impl DeployStatus {
    /// Convert status to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Confirmed => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }
}

pub type DeployReceipt = CallReceipt;

/// Drives a Safe deployment through the proxy factory.
///
/// Capability handles are optional until wired; [`SafeDeployer::deploy`]
/// refuses to touch the ledger while any required handle is missing. The
/// gas oracle is advisory and never blocks a deployment.
pub struct SafeDeployer {
    transactor: Option<Arc<dyn Transactor>>,
    master_copy: Option<Arc<dyn MasterCopy>>,
    proxy_factory: Option<Arc<dyn ProxyFactory>>,
    fallback_handler: Option<Arc<dyn FallbackHandler>>,
    gas_oracle: Option<Arc<dyn GasOracle>>,
    status: watch::Sender<DeployStatus>,
}

impl SafeDeployer {
    pub fn new() -> Self {
        let (status, _) = watch::channel(DeployStatus::Idle);
        SafeDeployer {
            transactor: None,
            master_copy: None,
            proxy_factory: None,
            fallback_handler: None,
            gas_oracle: None,
            status,
        }
    }

    pub fn with_transactor(mut self, transactor: Arc<dyn Transactor>) -> Self {
        self.transactor = Some(transactor);
        self
    }

    pub fn with_master_copy(mut self, master_copy: Arc<dyn MasterCopy>) -> Self {
        self.master_copy = Some(master_copy);
        self
    }

    pub fn with_proxy_factory(mut self, proxy_factory: Arc<dyn ProxyFactory>) -> Self {
        self.proxy_factory = Some(proxy_factory);
        self
    }

    pub fn with_fallback_handler(mut self, fallback_handler: Arc<dyn FallbackHandler>) -> Self {
        self.fallback_handler = Some(fallback_handler);
        self
    }

    pub fn with_gas_oracle(mut self, gas_oracle: Arc<dyn GasOracle>) -> Self {
        self.gas_oracle = Some(gas_oracle);
        self
    }

    /// Snapshot of the current status; [`SafeDeployer::subscribe`] for
    /// change notifications.
    pub fn status(&self) -> DeployStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeployStatus> {
        self.status.subscribe()
    }

    pub fn proxy_factory(&self) -> Option<&Arc<dyn ProxyFactory>> {
        self.proxy_factory.as_ref()
    }

    /// Deploy a Safe for the roster: encode the setup initializer, submit
    /// the factory call and wait for its terminal state.
    ///
    /// Dropping the returned future abandons the wait without retracting
    /// anything already submitted.
    pub async fn deploy(&self, roster: &SafeRoster) -> Result<DeployReceipt, DeployError> {
        match self.run(roster).await {
            Ok(receipt) => {
                self.status.send_replace(DeployStatus::Confirmed);
                Ok(receipt)
            }
            Err(err) => {
                self.status.send_replace(DeployStatus::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run(&self, roster: &SafeRoster) -> Result<DeployReceipt, DeployError> {
        let transactor = self
            .transactor
            .as_ref()
            .ok_or(DeployError::MissingDependency("transactor"))?;
        let master_copy = self
            .master_copy
            .as_ref()
            .ok_or(DeployError::MissingDependency("master copy"))?;
        let factory = self
            .proxy_factory
            .as_ref()
            .ok_or(DeployError::MissingDependency("proxy factory"))?;
        let fallback_handler = self
            .fallback_handler
            .as_ref()
            .ok_or(DeployError::MissingDependency("fallback handler"))?;

        let owners = parse_owner_addresses(roster)?;
        let setup = SetupCall::for_owners(owners, roster.threshold(), fallback_handler.address());
        let initializer = master_copy.encode_setup_call(&setup);
        let mut call = factory.create_proxy_call(master_copy.address(), initializer);

        if let Some(oracle) = &self.gas_oracle {
            match oracle.gas_price(GasSpeed::Fast).await {
                Ok(price) => call.gas_price = Some(price),
                Err(err) => warn!("Gas quote unavailable, submitting without a hint: {}", err),
            }
        }

        self.status.send_replace(DeployStatus::Submitting);
        info!(
            "Submitting Safe deployment of {} owners (threshold {}) via factory {:?}",
            setup.owners.len(),
            setup.threshold,
            factory.address()
        );
        let pending = transactor.submit(call).await?;

        self.status.send_replace(DeployStatus::AwaitingConfirmation);
        info!("Awaiting confirmation of {}", pending.tx_hash);
        let receipt = transactor.confirmation(&pending).await?;

        let gas_price = format_units(receipt.effective_gas_price, 9u8)
            .unwrap_or_else(|_| receipt.effective_gas_price.to_string());
        info!(
            "Safe deployment confirmed in block {}: {} of {} gas used at {} gwei",
            receipt.block_number, receipt.gas_used, receipt.gas_limit, gas_price
        );

        Ok(receipt)
    }
}

impl Default for SafeDeployer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_owner_addresses(roster: &SafeRoster) -> Result<Vec<Address>, DeployError> {
    roster
        .owners()
        .iter()
        .map(|owner| {
            owner
                .address
                .parse::<Address>()
                .map_err(|_| DeployError::InvalidOwnerAddress {
                    address: owner.address.clone(),
                })
        })
        .collect()
}
