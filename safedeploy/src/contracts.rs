use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};

use crate::capabilities::ContractCall;

// Define the Safe deployment surface using sol! macro for type-safe ABI
// encoding. The macro automatically generates SolCall trait implementations
// with SELECTOR constants, and SolEvent implementations for topic hashes.
sol! {
    interface IGnosisSafe {
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address payable paymentReceiver
        ) external;
    }

    interface IProxyFactory {
        event ProxyCreation(address proxy);

        function createProxy(address masterCopy, bytes memory data)
            external
            returns (address proxy);
    }
}

/// The `setup` initializer executed on a freshly created proxy.
///
/// Only the owner set, the threshold and the fallback handler vary between
/// deployments; the delegate-call and payment fields are pinned to zero
/// values because this flow never uses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupCall {
    pub owners: Vec<Address>,
    pub threshold: u32,
    pub to: Address,
    pub data: Bytes,
    pub fallback_handler: Address,
    pub payment_token: Address,
    pub payment: U256,
    pub payment_receiver: Address,
}

impl SetupCall {
    /// Setup payload for the given owners, threshold and fallback handler,
    /// with every other field zeroed.
    pub fn for_owners(owners: Vec<Address>, threshold: u32, fallback_handler: Address) -> Self {
        SetupCall {
            owners,
            threshold,
            to: Address::ZERO,
            data: Bytes::new(),
            fallback_handler,
            payment_token: Address::ZERO,
            payment: U256::ZERO,
            payment_receiver: Address::ZERO,
        }
    }

    /// ABI-encode the call, selector included. Equal payloads encode to
    /// equal bytes.
    pub fn encode(&self) -> Bytes {
        IGnosisSafe::setupCall {
            _owners: self.owners.clone(),
            _threshold: U256::from(self.threshold),
            to: self.to,
            data: self.data.clone(),
            fallbackHandler: self.fallback_handler,
            paymentToken: self.payment_token,
            payment: self.payment,
            paymentReceiver: self.payment_receiver,
        }
        .abi_encode()
        .into()
    }
}

/// Prepare the factory call that creates a proxy for `master_copy` and runs
/// `initializer` on it.
pub fn encode_create_proxy(factory: Address, master_copy: Address, initializer: Bytes) -> ContractCall {
    let data: Bytes = IProxyFactory::createProxyCall {
        masterCopy: master_copy,
        data: initializer,
    }
    .abi_encode()
    .into();

    ContractCall {
        to: factory,
        data,
        value: U256::ZERO,
        gas_price: None,
    }
}

/// Topic hash identifying `ProxyCreation(address)` logs.
pub fn proxy_creation_topic() -> B256 {
    IProxyFactory::ProxyCreation::SIGNATURE_HASH
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use pretty_assertions::assert_eq;

    fn addr(tag: u8) -> Address {
        Address::repeat_byte(tag)
    }

    fn sample_setup() -> SetupCall {
        SetupCall::for_owners(vec![addr(0x11), addr(0x22)], 2, addr(0xFB))
    }

    #[test]
    fn test_setup_selector_matches_deployed_master_copy() {
        assert_eq!(hex::encode(IGnosisSafe::setupCall::SELECTOR), "b63e800d");

        let encoded = sample_setup().encode();
        assert_eq!(&encoded[..4], &IGnosisSafe::setupCall::SELECTOR);
    }

    #[test]
    fn test_create_proxy_selector_matches_deployed_factory() {
        assert_eq!(hex::encode(IProxyFactory::createProxyCall::SELECTOR), "61b69abd");
    }

    #[test]
    fn test_setup_encoding_is_deterministic() {
        let first = sample_setup().encode();
        let second = sample_setup().encode();
        assert_eq!(first, second);
    }

    #[test]
    fn test_setup_round_trips_through_abi() {
        let encoded = sample_setup().encode();
        let call = IGnosisSafe::setupCall::abi_decode(&encoded).expect("valid setup calldata");

        assert_eq!(call._owners, vec![addr(0x11), addr(0x22)]);
        assert_eq!(call._threshold, U256::from(2));
        assert_eq!(call.fallbackHandler, addr(0xFB));
    }

    #[test]
    fn test_setup_pins_delegate_and_payment_fields_to_zero() {
        let encoded = sample_setup().encode();
        let call = IGnosisSafe::setupCall::abi_decode(&encoded).expect("valid setup calldata");

        assert_eq!(call.to, Address::ZERO);
        assert_eq!(call.data, Bytes::new());
        assert_eq!(call.paymentToken, Address::ZERO);
        assert_eq!(call.payment, U256::ZERO);
        assert_eq!(call.paymentReceiver, Address::ZERO);
    }

    #[test]
    fn test_create_proxy_call_targets_factory_with_no_value() {
        let initializer = sample_setup().encode();
        let call = encode_create_proxy(addr(0xFA), addr(0xAA), initializer.clone());

        assert_eq!(call.to, addr(0xFA));
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(call.gas_price, None);

        let decoded =
            IProxyFactory::createProxyCall::abi_decode(&call.data).expect("valid factory calldata");
        assert_eq!(decoded.masterCopy, addr(0xAA));
        assert_eq!(decoded.data, initializer);
    }

    #[test]
    fn test_proxy_creation_topic_hashes_event_signature() {
        assert_eq!(proxy_creation_topic(), keccak256("ProxyCreation(address)"));
    }
}
