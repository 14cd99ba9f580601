use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process-local identifier for a roster row. Keys are never persisted and
/// never reused while the row is alive.
pub type OwnerKey = u64;

/// A prospective Safe owner as edited in the roster.
///
/// The address is kept as the raw entered string; format is not checked
/// here. The deployment flow parses it when the setup call is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub key: OwnerKey,
    pub address: String,
}

/// The closed set of mutations [`SafeRoster::apply`] accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterAction {
    /// Append a new row with a fresh key and an empty address.
    AddOwner,
    /// Overwrite the address of the row with the given key.
    UpdateOwnerAddress { key: OwnerKey, value: String },
    /// Delete the row with the given key. Absent keys are a no-op.
    RemoveOwner { key: OwnerKey },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Owner with key {key} not found")]
    OwnerNotFound { key: OwnerKey },
}

/// Ordered owner list plus signature threshold for a Safe about to be
/// deployed.
///
/// Insertion order is display order. The roster does not deduplicate
/// addresses, enforce a minimum owner count or range-check the threshold;
/// the master copy rejects invalid setups when the deployment executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeRoster {
    owners: Vec<Owner>,
    threshold: u32,
}

impl SafeRoster {
    /// Roster seeded with the connected account as sole owner and a
    /// threshold of one.
    pub fn seeded(connected_account: impl Into<String>) -> Self {
        let mut roster = SafeRoster {
            owners: Vec::new(),
            threshold: 1,
        };
        let key = roster.fresh_key();
        roster.owners.push(Owner {
            key,
            address: connected_account.into(),
        });
        roster
    }

    /// Apply one mutation. Updating an unknown key is the only failure and
    /// leaves the roster untouched.
    pub fn apply(&mut self, action: RosterAction) -> Result<(), RosterError> {
        match action {
            RosterAction::AddOwner => {
                let key = self.fresh_key();
                self.owners.push(Owner {
                    key,
                    address: String::new(),
                });
                Ok(())
            }
            RosterAction::UpdateOwnerAddress { key, value } => {
                match self.owners.iter_mut().find(|owner| owner.key == key) {
                    Some(owner) => {
                        owner.address = value;
                        Ok(())
                    }
                    None => Err(RosterError::OwnerNotFound { key }),
                }
            }
            RosterAction::RemoveOwner { key } => {
                self.owners.retain(|owner| owner.key != key);
                Ok(())
            }
        }
    }

    pub fn owners(&self) -> &[Owner] {
        &self.owners
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    // Keys stay in a six-digit range; the rare collision is re-rolled so
    // live rows always have distinct keys.
    fn fresh_key(&self) -> OwnerKey {
        let mut rng = rand::rng();
        loop {
            let key: OwnerKey = rng.random_range(0..1_000_000);
            if !self.owners.iter().any(|owner| owner.key == key) {
                return key;
            }
        }
    }
}
