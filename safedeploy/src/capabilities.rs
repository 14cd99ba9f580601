use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;

use crate::contracts::{self, SetupCall};
use crate::error::{QueryError, SubmitError};

/// A prepared contract call: destination, calldata, attached value and an
/// optional gas price hint from the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas_price: Option<U256>,
}

/// Opaque handle to an in-flight submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub tx_hash: TxHash,
}

/// Terminal receipt for a confirmed call. A reverted execution surfaces as
/// [`SubmitError::Reverted`], never as a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub effective_gas_price: U256,
}

/// Filter over historical event logs: emitting contract plus signature
/// topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub address: Address,
    pub topic0: B256,
}

/// One historical `ProxyCreation` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCreationEvent {
    pub proxy: Address,
    pub block_number: u64,
}

/// Signing and submission capability. Implementations front a wallet plus
/// ledger connection; the flow never sees keys or transports.
#[async_trait]
pub trait Transactor: Send + Sync {
    /// Sign and submit the call. An `Err` here means nothing reached the
    /// ledger.
    async fn submit(&self, call: ContractCall) -> Result<PendingCall, SubmitError>;

    /// Suspend until the submitted call reaches a terminal state. No
    /// timeout is imposed at this layer.
    async fn confirmation(&self, pending: &PendingCall) -> Result<CallReceipt, SubmitError>;
}

/// Reference to the Safe master copy new proxies delegate to.
pub trait MasterCopy: Send + Sync {
    fn address(&self) -> Address;

    /// ABI-encode the `setup` initializer against this template.
    fn encode_setup_call(&self, setup: &SetupCall) -> Bytes {
        setup.encode()
    }
}

/// Reference to the proxy factory. Prepares creation calls and answers
/// event-history queries.
#[async_trait]
pub trait ProxyFactory: Send + Sync {
    fn address(&self) -> Address;

    /// Prepare `createProxy(master_copy, initializer)` against this
    /// factory.
    fn create_proxy_call(&self, master_copy: Address, initializer: Bytes) -> ContractCall {
        contracts::encode_create_proxy(self.address(), master_copy, initializer)
    }

    /// Filter matching every `ProxyCreation` log this factory ever emitted.
    fn proxy_creation_filter(&self) -> EventFilter {
        EventFilter {
            address: self.address(),
            topic0: contracts::proxy_creation_topic(),
        }
    }

    /// Fetch matching logs from genesis to the current head, oldest first.
    /// Callers rely on proxy creation being rare enough that the full scan
    /// stays cheap.
    async fn creation_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<ProxyCreationEvent>, QueryError>;
}

/// Reference to the fallback handler installed on newly deployed Safes.
pub trait FallbackHandler: Send + Sync {
    fn address(&self) -> Address;
}
