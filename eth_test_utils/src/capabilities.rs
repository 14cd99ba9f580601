use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use safedeploy::capabilities::{
    CallReceipt, ContractCall, EventFilter, FallbackHandler, MasterCopy, PendingCall,
    ProxyCreationEvent, ProxyFactory, Transactor,
};
use safedeploy::contracts::proxy_creation_topic;
use safedeploy::error::{QueryError, SubmitError};

use crate::ledger::SimLedger;

/// Transactor backed by the simulated ledger
pub struct SimTransactor {
    ledger: Arc<SimLedger>,
}

impl SimTransactor {
    pub fn new(ledger: Arc<SimLedger>) -> Self {
        SimTransactor { ledger }
    }
}

#[async_trait]
impl Transactor for SimTransactor {
    async fn submit(&self, call: ContractCall) -> Result<PendingCall, SubmitError> {
        let tx_hash = self.ledger.submit(&call)?;
        Ok(PendingCall { tx_hash })
    }

    async fn confirmation(&self, pending: &PendingCall) -> Result<CallReceipt, SubmitError> {
        tokio::time::sleep(self.ledger.config().confirmation_delay).await;
        self.ledger.outcome(&pending.tx_hash)
    }
}

/// Proxy factory view over the simulated ledger
pub struct SimFactory {
    ledger: Arc<SimLedger>,
}

impl SimFactory {
    pub fn new(ledger: Arc<SimLedger>) -> Self {
        SimFactory { ledger }
    }
}

#[async_trait]
impl ProxyFactory for SimFactory {
    fn address(&self) -> Address {
        self.ledger.config().proxy_factory
    }

    async fn creation_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<ProxyCreationEvent>, QueryError> {
        // A filter scoped to some other contract or event matches nothing.
        if filter.address != self.address() || filter.topic0 != proxy_creation_topic() {
            return Ok(Vec::new());
        }
        self.ledger.creation_events()
    }
}

/// Master copy stub living at a fixed address
pub struct SimMasterCopy {
    address: Address,
}

impl SimMasterCopy {
    pub fn new(address: Address) -> Self {
        SimMasterCopy { address }
    }
}

impl MasterCopy for SimMasterCopy {
    fn address(&self) -> Address {
        self.address
    }
}

/// Fallback handler stub living at a fixed address
pub struct SimFallbackHandler {
    address: Address,
}

impl SimFallbackHandler {
    pub fn new(address: Address) -> Self {
        SimFallbackHandler { address }
    }
}

impl FallbackHandler for SimFallbackHandler {
    fn address(&self) -> Address {
        self.address
    }
}
