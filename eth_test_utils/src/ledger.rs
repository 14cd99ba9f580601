use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, TxHash, U256};
use alloy_sol_types::SolCall;
use safedeploy::capabilities::{CallReceipt, ContractCall, ProxyCreationEvent};
use safedeploy::contracts::{IGnosisSafe, IProxyFactory};
use safedeploy::error::{QueryError, SubmitError};
use tracing::{debug, info};

// Linked-list sentinel the master copy reserves; never a valid owner.
const SENTINEL_OWNERS: Address = Address::with_last_byte(0x01);

/// Configuration for the simulated ledger
#[derive(Debug, Clone)]
pub struct SimLedgerConfig {
    /// Address the Safe master copy lives at
    pub master_copy: Address,
    /// Address the proxy factory lives at
    pub proxy_factory: Address,
    /// Address of the fallback handler handed to setup
    pub fallback_handler: Address,
    /// Account submitting deployments
    pub deployer: Address,
    /// Simulated confirmation latency
    pub confirmation_delay: Duration,
    /// Gas limit stamped on submitted calls
    pub gas_limit: u64,
}

impl Default for SimLedgerConfig {
    fn default() -> Self {
        Self {
            master_copy: Address::repeat_byte(0xAA),
            proxy_factory: Address::repeat_byte(0xFA),
            fallback_handler: Address::repeat_byte(0xFB),
            deployer: Address::repeat_byte(0xDE),
            confirmation_delay: Duration::from_millis(10),
            gas_limit: 500_000,
        }
    }
}

impl SimLedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_deployer(mut self, deployer: Address) -> Self {
        self.deployer = deployer;
        self
    }
}

#[derive(Debug, Clone)]
enum TxOutcome {
    Deployed { receipt: CallReceipt },
    Reverted { reason: String },
}

#[derive(Default)]
struct LedgerState {
    height: u64,
    creation_nonce: u64,
    events: Vec<ProxyCreationEvent>,
    outcomes: HashMap<TxHash, TxOutcome>,
    reject_next: Option<String>,
    fail_queries: bool,
    submissions: u64,
    queries: u64,
}

/// In-process ledger simulating the proxy factory and the owner rules the
/// v1.1.1 master copy enforces during setup.
///
/// Submissions execute immediately and record a terminal outcome; the
/// confirmation latency lives in the transactor wrapper. Fault injection
/// covers signer rejection and history-query failure.
pub struct SimLedger {
    config: SimLedgerConfig,
    state: Mutex<LedgerState>,
}

impl SimLedger {
    pub fn new(config: SimLedgerConfig) -> Self {
        SimLedger {
            config,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn config(&self) -> &SimLedgerConfig {
        &self.config
    }

    /// Reject the next submission with the given reason. One shot: the
    /// submission after that goes through again.
    pub fn reject_next_submission(&self, reason: impl Into<String>) {
        self.state.lock().expect("ledger state").reject_next = Some(reason.into());
    }

    /// Make history queries fail until cleared.
    pub fn set_fail_queries(&self, fail: bool) {
        self.state.lock().expect("ledger state").fail_queries = fail;
    }

    /// Submissions that reached the ledger, rejected ones included.
    pub fn submission_count(&self) -> u64 {
        self.state.lock().expect("ledger state").submissions
    }

    /// History queries answered, failed ones included.
    pub fn query_count(&self) -> u64 {
        self.state.lock().expect("ledger state").queries
    }

    /// Current chain height.
    pub fn height(&self) -> u64 {
        self.state.lock().expect("ledger state").height
    }

    /// Execute a submitted call and record its terminal outcome.
    pub fn submit(&self, call: &ContractCall) -> Result<TxHash, SubmitError> {
        let mut state = self.state.lock().expect("ledger state");
        state.submissions += 1;

        if let Some(reason) = state.reject_next.take() {
            debug!("Rejecting submission by request: {}", reason);
            return Err(SubmitError::Rejected { reason });
        }
        if call.to != self.config.proxy_factory {
            return Err(SubmitError::Rejected {
                reason: format!("No contract at {:?}", call.to),
            });
        }

        state.height += 1;
        let tx_hash = next_tx_hash(state.height, &call.data);
        let outcome = self.execute_create_proxy(&mut state, tx_hash, call);
        state.outcomes.insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    /// Terminal state of a submitted call.
    pub fn outcome(&self, tx_hash: &TxHash) -> Result<CallReceipt, SubmitError> {
        let state = self.state.lock().expect("ledger state");
        match state.outcomes.get(tx_hash) {
            Some(TxOutcome::Deployed { receipt }) => Ok(receipt.clone()),
            Some(TxOutcome::Reverted { reason }) => Err(SubmitError::Reverted {
                tx_hash: *tx_hash,
                reason: reason.clone(),
            }),
            None => Err(SubmitError::Rejected {
                reason: format!("Unknown transaction {tx_hash}"),
            }),
        }
    }

    /// Every `ProxyCreation` event recorded so far, oldest first.
    pub fn creation_events(&self) -> Result<Vec<ProxyCreationEvent>, QueryError> {
        let mut state = self.state.lock().expect("ledger state");
        state.queries += 1;
        if state.fail_queries {
            return Err(QueryError::FetchFailed {
                reason: "Injected query failure".to_string(),
            });
        }
        Ok(state.events.clone())
    }

    fn execute_create_proxy(
        &self,
        state: &mut LedgerState,
        tx_hash: TxHash,
        call: &ContractCall,
    ) -> TxOutcome {
        let create = match IProxyFactory::createProxyCall::abi_decode(&call.data) {
            Ok(create) => create,
            Err(_) => {
                return TxOutcome::Reverted {
                    reason: "Unrecognized factory calldata".to_string(),
                }
            }
        };
        let setup = match IGnosisSafe::setupCall::abi_decode(&create.data) {
            Ok(setup) => setup,
            Err(_) => {
                return TxOutcome::Reverted {
                    reason: "Initializer is not a setup call".to_string(),
                }
            }
        };
        if let Err(reason) = validate_setup(&setup) {
            return TxOutcome::Reverted { reason };
        }

        let gas_used = 230_000 + 15_000 * setup._owners.len() as u64;
        if gas_used > self.config.gas_limit {
            return TxOutcome::Reverted {
                reason: "out of gas".to_string(),
            };
        }

        let proxy = next_proxy_address(self.config.proxy_factory, state.creation_nonce);
        state.creation_nonce += 1;
        state.events.push(ProxyCreationEvent {
            proxy,
            block_number: state.height,
        });

        info!(
            "Created proxy {:?} for master copy {:?} at block {}",
            proxy, create.masterCopy, state.height
        );

        TxOutcome::Deployed {
            receipt: CallReceipt {
                tx_hash,
                block_number: state.height,
                gas_used,
                gas_limit: self.config.gas_limit,
                effective_gas_price: call
                    .gas_price
                    .unwrap_or(U256::from(1_000_000_000u64)),
            },
        }
    }
}

// Mirrors the require order of setupOwners in the v1.1.1 master copy.
fn validate_setup(setup: &IGnosisSafe::setupCall) -> Result<(), String> {
    let owners = &setup._owners;
    if setup._threshold > U256::from(owners.len()) {
        return Err("Threshold cannot exceed owner count".to_string());
    }
    if setup._threshold < U256::from(1) {
        return Err("Threshold needs to be greater than 0".to_string());
    }
    let mut seen = HashSet::new();
    for owner in owners {
        if *owner == Address::ZERO || *owner == SENTINEL_OWNERS {
            return Err("Invalid owner address provided".to_string());
        }
        if !seen.insert(*owner) {
            return Err("Duplicate owner address provided".to_string());
        }
    }
    Ok(())
}

fn next_tx_hash(height: u64, data: &[u8]) -> TxHash {
    let mut preimage = height.to_be_bytes().to_vec();
    preimage.extend_from_slice(data);
    keccak256(preimage)
}

fn next_proxy_address(factory: Address, nonce: u64) -> Address {
    let mut preimage = factory.to_vec();
    preimage.extend_from_slice(&nonce.to_be_bytes());
    Address::from_slice(&keccak256(preimage)[12..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use safedeploy::contracts::{encode_create_proxy, SetupCall};

    fn ledger() -> SimLedger {
        SimLedger::new(SimLedgerConfig::default())
    }

    fn creation_call(ledger: &SimLedger, owners: Vec<Address>, threshold: u32) -> ContractCall {
        let config = ledger.config();
        let setup = SetupCall::for_owners(owners, threshold, config.fallback_handler);
        encode_create_proxy(config.proxy_factory, config.master_copy, setup.encode())
    }

    fn confirmed(ledger: &SimLedger, call: &ContractCall) -> Result<CallReceipt, SubmitError> {
        let tx_hash = ledger.submit(call)?;
        ledger.outcome(&tx_hash)
    }

    #[test]
    fn test_valid_deployment_records_event_and_receipt() {
        let ledger = ledger();
        let call = creation_call(&ledger, vec![Address::repeat_byte(0x11)], 1);

        let receipt = confirmed(&ledger, &call).unwrap();

        assert_eq!(receipt.block_number, 1);
        assert_eq!(receipt.gas_limit, 500_000);
        assert!(receipt.gas_used > 0);

        let events = ledger.creation_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_ne!(events[0].proxy, Address::ZERO);
        assert_eq!(events[0].block_number, 1);
    }

    #[test]
    fn test_threshold_above_owner_count_reverts() {
        let ledger = ledger();
        let call = creation_call(&ledger, vec![Address::repeat_byte(0x11)], 2);

        let err = confirmed(&ledger, &call).unwrap_err();

        match err {
            SubmitError::Reverted { reason, .. } => {
                assert_eq!(reason, "Threshold cannot exceed owner count")
            }
            other => panic!("expected revert, got {other:?}"),
        }
        assert!(ledger.creation_events().unwrap().is_empty());
    }

    #[test]
    fn test_zero_threshold_reverts() {
        let ledger = ledger();
        let call = creation_call(&ledger, Vec::new(), 0);

        let err = confirmed(&ledger, &call).unwrap_err();

        match err {
            SubmitError::Reverted { reason, .. } => {
                assert_eq!(reason, "Threshold needs to be greater than 0")
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_address_owner_reverts() {
        let ledger = ledger();
        let call = creation_call(&ledger, vec![Address::ZERO], 1);

        let err = confirmed(&ledger, &call).unwrap_err();

        match err {
            SubmitError::Reverted { reason, .. } => {
                assert_eq!(reason, "Invalid owner address provided")
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_owner_reverts() {
        let ledger = ledger();
        let owner = Address::repeat_byte(0x11);
        let call = creation_call(&ledger, vec![owner, owner], 1);

        let err = confirmed(&ledger, &call).unwrap_err();

        match err {
            SubmitError::Reverted { reason, .. } => {
                assert_eq!(reason, "Duplicate owner address provided")
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[test]
    fn test_reject_next_is_one_shot() {
        let ledger = ledger();
        let call = creation_call(&ledger, vec![Address::repeat_byte(0x11)], 1);

        ledger.reject_next_submission("user denied signature");

        let err = ledger.submit(&call).unwrap_err();
        assert_eq!(
            err,
            SubmitError::Rejected {
                reason: "user denied signature".to_string(),
            }
        );

        assert!(confirmed(&ledger, &call).is_ok());
        assert_eq!(ledger.submission_count(), 2);
    }

    #[test]
    fn test_fail_queries_toggles() {
        let ledger = ledger();

        ledger.set_fail_queries(true);
        assert!(ledger.creation_events().is_err());

        ledger.set_fail_queries(false);
        assert!(ledger.creation_events().is_ok());
        assert_eq!(ledger.query_count(), 2);
    }

    #[test]
    fn test_submission_to_unknown_contract_is_rejected() {
        let ledger = ledger();
        let mut call = creation_call(&ledger, vec![Address::repeat_byte(0x11)], 1);
        call.to = Address::repeat_byte(0x99);

        let err = ledger.submit(&call).unwrap_err();

        assert!(matches!(err, SubmitError::Rejected { .. }));
        assert!(ledger.creation_events().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_initializer_reverts() {
        let ledger = ledger();
        let config = ledger.config();
        let call = encode_create_proxy(
            config.proxy_factory,
            config.master_copy,
            vec![0xde, 0xad].into(),
        );

        let err = confirmed(&ledger, &call).unwrap_err();

        match err {
            SubmitError::Reverted { reason, .. } => {
                assert_eq!(reason, "Initializer is not a setup call")
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[test]
    fn test_gas_limit_below_execution_cost_reverts() {
        let ledger = SimLedger::new(SimLedgerConfig::default().with_gas_limit(100_000));
        let call = creation_call(&ledger, vec![Address::repeat_byte(0x11)], 1);

        let err = confirmed(&ledger, &call).unwrap_err();

        match err {
            SubmitError::Reverted { reason, .. } => assert_eq!(reason, "out of gas"),
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[test]
    fn test_proxy_addresses_are_deterministic_per_factory_nonce() {
        let first = ledger();
        let second = ledger();
        let call = creation_call(&first, vec![Address::repeat_byte(0x11)], 1);

        confirmed(&first, &call).unwrap();
        confirmed(&second, &call).unwrap();
        confirmed(&second, &call).unwrap();

        let first_events = first.creation_events().unwrap();
        let second_events = second.creation_events().unwrap();
        assert_eq!(first_events[0].proxy, second_events[0].proxy);
        assert_ne!(second_events[0].proxy, second_events[1].proxy);
    }

    #[test]
    fn test_events_accumulate_in_block_order() {
        let ledger = ledger();
        let call = creation_call(&ledger, vec![Address::repeat_byte(0x11)], 1);

        confirmed(&ledger, &call).unwrap();
        confirmed(&ledger, &call).unwrap();
        confirmed(&ledger, &call).unwrap();

        let events = ledger.creation_events().unwrap();
        assert_eq!(events.len(), 3);
        let blocks: Vec<u64> = events.iter().map(|event| event.block_number).collect();
        assert_eq!(blocks, vec![1, 2, 3]);
    }
}
