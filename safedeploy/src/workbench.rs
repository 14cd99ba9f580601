use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::deploy::{DeployReceipt, DeployStatus, SafeDeployer};
use crate::error::{DeployError, QueryError};
use crate::query;
use crate::roster::{Owner, RosterAction, RosterError, SafeRoster};

/// Owns the roster, the deployed-proxy list and the deployment flow: the
/// single writer for everything a Safe creation screen shows.
///
/// Share across tasks behind `Arc<tokio::sync::Mutex<_>>`. Methods take
/// `&mut self`, so edits, deployment and refresh serialize naturally.
pub struct SafeWorkbench {
    roster: SafeRoster,
    proxies: Vec<Address>,
    deployer: SafeDeployer,
}

impl SafeWorkbench {
    /// Workbench seeded with the connected account as sole owner.
    pub fn new(connected_account: impl Into<String>, deployer: SafeDeployer) -> Self {
        SafeWorkbench {
            roster: SafeRoster::seeded(connected_account),
            proxies: Vec::new(),
            deployer,
        }
    }

    pub fn apply(&mut self, action: RosterAction) -> Result<(), RosterError> {
        self.roster.apply(action)
    }

    pub fn owners(&self) -> &[Owner] {
        self.roster.owners()
    }

    pub fn threshold(&self) -> u32 {
        self.roster.threshold()
    }

    pub fn set_threshold(&mut self, threshold: u32) {
        self.roster.set_threshold(threshold);
    }

    pub fn roster(&self) -> &SafeRoster {
        &self.roster
    }

    /// Deployed proxies as of the last successful refresh, oldest first.
    pub fn proxies(&self) -> &[Address] {
        &self.proxies
    }

    pub fn status(&self) -> DeployStatus {
        self.deployer.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<DeployStatus> {
        self.deployer.subscribe()
    }

    /// Re-scan the factory's creation history and replace the stored list
    /// wholesale.
    pub async fn refresh_proxies(&mut self) -> Result<&[Address], QueryError> {
        let factory = self
            .deployer
            .proxy_factory()
            .cloned()
            .ok_or_else(|| QueryError::FetchFailed {
                reason: "Proxy factory not resolved".to_string(),
            })?;
        let proxies = query::deployed_proxies(factory.as_ref()).await?;
        self.proxies = proxies;
        Ok(&self.proxies)
    }

    /// Deploy a Safe for the current roster, then refresh the proxy list.
    ///
    /// A refresh failure after a confirmed deployment is logged and leaves
    /// the previous list in place; the receipt is still returned.
    pub async fn deploy(&mut self) -> Result<DeployReceipt, DeployError> {
        let receipt = self.deployer.deploy(&self.roster).await?;
        info!("Safe deployed at tx {}, refreshing proxy list", receipt.tx_hash);
        if let Err(err) = self.refresh_proxies().await {
            warn!("Proxy list refresh failed, keeping the previous list: {}", err);
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{
        CallReceipt, ContractCall, EventFilter, FallbackHandler, MasterCopy, PendingCall,
        ProxyCreationEvent, ProxyFactory, Transactor,
    };
    use crate::error::SubmitError;
    use alloy_primitives::TxHash;
    use alloy_primitives::U256;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;

    const CONNECTED: &str = "0x1111111111111111111111111111111111111111";

    struct FixedMasterCopy;

    impl MasterCopy for FixedMasterCopy {
        fn address(&self) -> Address {
            Address::repeat_byte(0xAA)
        }
    }

    struct FixedFallback;

    impl FallbackHandler for FixedFallback {
        fn address(&self) -> Address {
            Address::repeat_byte(0xFB)
        }
    }

    struct OkTransactor;

    #[async_trait]
    impl Transactor for OkTransactor {
        async fn submit(&self, _call: ContractCall) -> Result<PendingCall, SubmitError> {
            Ok(PendingCall {
                tx_hash: TxHash::repeat_byte(0x77),
            })
        }

        async fn confirmation(&self, pending: &PendingCall) -> Result<CallReceipt, SubmitError> {
            Ok(CallReceipt {
                tx_hash: pending.tx_hash,
                block_number: 7,
                gas_used: 260_000,
                gas_limit: 500_000,
                effective_gas_price: U256::from(1_000_000_000u64),
            })
        }
    }

    #[derive(Default)]
    struct ToggleFactory {
        events: StdMutex<Vec<ProxyCreationEvent>>,
        fail: AtomicBool,
    }

    impl ToggleFactory {
        fn set_events(&self, proxies: &[Address]) {
            let events = proxies
                .iter()
                .enumerate()
                .map(|(i, proxy)| ProxyCreationEvent {
                    proxy: *proxy,
                    block_number: i as u64 + 1,
                })
                .collect();
            *self.events.lock().unwrap() = events;
        }
    }

    #[async_trait]
    impl ProxyFactory for ToggleFactory {
        fn address(&self) -> Address {
            Address::repeat_byte(0xFA)
        }

        async fn creation_events(
            &self,
            _filter: &EventFilter,
        ) -> Result<Vec<ProxyCreationEvent>, QueryError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(QueryError::FetchFailed {
                    reason: "injected".to_string(),
                });
            }
            Ok(self.events.lock().unwrap().clone())
        }
    }

    fn workbench_with_factory(factory: Arc<ToggleFactory>) -> SafeWorkbench {
        let deployer = SafeDeployer::new()
            .with_transactor(Arc::new(OkTransactor))
            .with_master_copy(Arc::new(FixedMasterCopy))
            .with_proxy_factory(factory)
            .with_fallback_handler(Arc::new(FixedFallback));
        SafeWorkbench::new(CONNECTED, deployer)
    }

    #[tokio::test]
    async fn test_refresh_replaces_list_wholesale() {
        let factory = Arc::new(ToggleFactory::default());
        let mut workbench = workbench_with_factory(factory.clone());

        factory.set_events(&[Address::repeat_byte(0x01)]);
        workbench.refresh_proxies().await.unwrap();
        assert_eq!(workbench.proxies(), &[Address::repeat_byte(0x01)]);

        factory.set_events(&[Address::repeat_byte(0x02), Address::repeat_byte(0x03)]);
        workbench.refresh_proxies().await.unwrap();
        assert_eq!(
            workbench.proxies(),
            &[Address::repeat_byte(0x02), Address::repeat_byte(0x03)]
        );
    }

    #[tokio::test]
    async fn test_refresh_without_factory_reports_fetch_failure() {
        let mut workbench = SafeWorkbench::new(CONNECTED, SafeDeployer::new());

        let err = workbench.refresh_proxies().await.unwrap_err();

        assert_eq!(
            err,
            QueryError::FetchFailed {
                reason: "Proxy factory not resolved".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_deploy_keeps_previous_list_when_refresh_fails() {
        let factory = Arc::new(ToggleFactory::default());
        let mut workbench = workbench_with_factory(factory.clone());

        factory.set_events(&[Address::repeat_byte(0x01)]);
        workbench.refresh_proxies().await.unwrap();

        factory.fail.store(true, Ordering::SeqCst);
        let receipt = workbench.deploy().await.unwrap();

        assert_eq!(receipt.tx_hash, TxHash::repeat_byte(0x77));
        assert_eq!(workbench.proxies(), &[Address::repeat_byte(0x01)]);
        assert_eq!(workbench.status(), DeployStatus::Confirmed);

        factory.fail.store(false, Ordering::SeqCst);
        factory.set_events(&[Address::repeat_byte(0x01), Address::repeat_byte(0x02)]);
        workbench.refresh_proxies().await.unwrap();
        assert_eq!(workbench.proxies().len(), 2);
    }

    #[tokio::test]
    async fn test_roster_edits_flow_through_apply() {
        let factory = Arc::new(ToggleFactory::default());
        let mut workbench = workbench_with_factory(factory);

        workbench.apply(RosterAction::AddOwner).unwrap();
        workbench.set_threshold(2);

        assert_eq!(workbench.owners().len(), 2);
        assert_eq!(workbench.threshold(), 2);
        assert_eq!(workbench.owners()[0].address, CONNECTED);
    }
}
