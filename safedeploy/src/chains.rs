use std::collections::HashMap;

use alloy_primitives::Address;

/// Addresses of the three Safe contracts a deployment needs on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeContracts {
    pub master_copy: Address,
    pub proxy_factory: Address,
    pub fallback_handler: Address,
}

/// The v1.1.1 release this flow encodes for: `createProxy` on the factory
/// plus the default callback handler.
pub struct SafeV111;

impl SafeV111 {
    /// Safe v1.1.1 master copy address
    pub fn master_copy() -> Address {
        "0x34CfAC646f301356fAa8B21e94227e3583Fe3F5F"
            .parse()
            .expect("Valid address")
    }

    /// Safe v1.1.1 proxy factory address
    pub fn proxy_factory() -> Address {
        "0x76E2cFc1F5Fa8F6a5b3fC4c8F4788F0116861F9B"
            .parse()
            .expect("Valid address")
    }

    /// DefaultCallbackHandler shipped with v1.1.1
    pub fn fallback_handler() -> Address {
        "0xd5D82B6aDDc9027B22dCA772Aa68D5d74cdBdF44"
            .parse()
            .expect("Valid address")
    }

    pub fn contracts() -> SafeContracts {
        SafeContracts {
            master_copy: Self::master_copy(),
            proxy_factory: Self::proxy_factory(),
            fallback_handler: Self::fallback_handler(),
        }
    }

    /// Chains carrying the deterministic v1.1.1 deployment
    pub fn default_chains() -> &'static [u64] {
        &[
            1,   // Ethereum
            100, // Gnosis Chain
        ]
    }
}

/// Registry of known Safe contract deployments keyed by chain id.
///
/// Seeded from the canonical v1.1.1 release; embedders register overrides
/// or additional chains on top.
pub struct ChainProfiles {
    profiles: HashMap<u64, SafeContracts>,
}

impl ChainProfiles {
    pub fn new() -> Self {
        ChainProfiles {
            profiles: HashMap::new(),
        }
    }

    /// Registry seeded with the canonical v1.1.1 deployments.
    pub fn canonical() -> Self {
        let mut registry = Self::new();
        for &chain_id in SafeV111::default_chains() {
            registry.register(chain_id, SafeV111::contracts());
        }
        registry
    }

    /// Register or replace the profile for a chain.
    pub fn register(&mut self, chain_id: u64, contracts: SafeContracts) {
        self.profiles.insert(chain_id, contracts);
    }

    pub fn get(&self, chain_id: u64) -> Option<&SafeContracts> {
        self.profiles.get(&chain_id)
    }

    /// Registered chain ids in ascending order.
    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.profiles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ChainProfiles {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_registry_covers_mainnet() {
        let registry = ChainProfiles::canonical();
        let mainnet = registry.get(1).expect("mainnet profile");

        assert_eq!(mainnet.master_copy, SafeV111::master_copy());
        assert_eq!(mainnet.proxy_factory, SafeV111::proxy_factory());
        assert_eq!(mainnet.fallback_handler, SafeV111::fallback_handler());
    }

    #[test]
    fn test_unknown_chain_has_no_profile() {
        let registry = ChainProfiles::canonical();
        assert!(registry.get(31337).is_none());
    }

    #[test]
    fn test_register_replaces_existing_profile() {
        let mut registry = ChainProfiles::canonical();
        let custom = SafeContracts {
            master_copy: Address::repeat_byte(0xAA),
            proxy_factory: Address::repeat_byte(0xFA),
            fallback_handler: Address::repeat_byte(0xFB),
        };

        registry.register(1, custom);

        assert_eq!(registry.get(1), Some(&custom));
    }

    #[test]
    fn test_chain_ids_are_sorted() {
        let mut registry = ChainProfiles::new();
        registry.register(100, SafeV111::contracts());
        registry.register(1, SafeV111::contracts());

        assert_eq!(registry.chain_ids(), vec![1, 100]);
    }

    #[test]
    fn test_release_addresses_are_distinct() {
        assert_ne!(SafeV111::master_copy(), SafeV111::proxy_factory());
        assert_ne!(SafeV111::proxy_factory(), SafeV111::fallback_handler());
    }
}
