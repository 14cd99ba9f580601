use safedeploy::roster::{OwnerKey, SafeRoster};

/// Trait for making assertions about the owner roster
pub trait RosterAssertions {
    /// Assert the number of rows in the roster
    fn assert_owner_count(&self, count: usize) -> &Self;

    /// Assert that some row holds the given address
    fn assert_has_address(&self, address: &str) -> &Self;

    /// Assert that a row with the given key exists
    fn assert_key_present(&self, key: OwnerKey) -> &Self;

    /// Assert that no two rows share a key
    fn assert_distinct_keys(&self) -> &Self;

    /// Assert the signature threshold
    fn assert_threshold(&self, threshold: u32) -> &Self;
}

impl RosterAssertions for SafeRoster {
    fn assert_owner_count(&self, count: usize) -> &Self {
        assert_eq!(
            self.owners().len(),
            count,
            "Expected {} owners, found {}",
            count,
            self.owners().len()
        );
        self
    }

    fn assert_has_address(&self, address: &str) -> &Self {
        assert!(
            self.owners().iter().any(|owner| owner.address == address),
            "No owner with address {}",
            address
        );
        self
    }

    fn assert_key_present(&self, key: OwnerKey) -> &Self {
        assert!(
            self.owners().iter().any(|owner| owner.key == key),
            "No owner with key {}",
            key
        );
        self
    }

    fn assert_distinct_keys(&self) -> &Self {
        let mut keys: Vec<OwnerKey> = self.owners().iter().map(|owner| owner.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(
            keys.len(),
            self.owners().len(),
            "Roster contains duplicate keys"
        );
        self
    }

    fn assert_threshold(&self, threshold: u32) -> &Self {
        assert_eq!(
            self.threshold(),
            threshold,
            "Expected threshold {}, found {}",
            threshold,
            self.threshold()
        );
        self
    }
}
