use std::fmt;

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::error::QueryError;

/// Speed tier for gas price quotes. Deployment submissions use the fast
/// tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSpeed {
    Fast,
    Average,
    Slow,
}

impl GasSpeed {
    /// Convert speed tier to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Average => "average",
            Self::Slow => "slow",
        }
    }
}

impl fmt::Display for GasSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GasSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "average" => Ok(Self::Average),
            "slow" => Ok(Self::Slow),
            _ => Err(format!(
                "Unsupported gas speed: {s}. Supported speeds are: fast, average, slow"
            )),
        }
    }
}

/// Source of current gas price quotes, in wei.
#[async_trait]
pub trait GasOracle: Send + Sync {
    async fn gas_price(&self, speed: GasSpeed) -> Result<U256, QueryError>;
}

/// Oracle answering with preset quotes. Enough for simulated ledgers and
/// tests.
#[derive(Debug, Clone)]
pub struct FixedGasOracle {
    fast: U256,
    average: U256,
    slow: U256,
}

impl FixedGasOracle {
    pub fn new(fast: U256, average: U256, slow: U256) -> Self {
        FixedGasOracle { fast, average, slow }
    }

    /// Quotes of 2, 1.5 and 1 gwei.
    pub fn gwei_defaults() -> Self {
        FixedGasOracle::new(
            U256::from(2_000_000_000u64),
            U256::from(1_500_000_000u64),
            U256::from(1_000_000_000u64),
        )
    }
}

#[async_trait]
impl GasOracle for FixedGasOracle {
    async fn gas_price(&self, speed: GasSpeed) -> Result<U256, QueryError> {
        Ok(match speed {
            GasSpeed::Fast => self.fast,
            GasSpeed::Average => self.average,
            GasSpeed::Slow => self.slow,
        })
    }
}
