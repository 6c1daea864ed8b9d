use crate::application::cashback::{CashbackPolicy, MILLISECONDS_IN_ONE_DAY};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Fraction of each payment credited back as cashback.
    pub cashback_rate: Decimal,
    /// Delay between a payment and its cashback becoming due.
    pub cashback_delay_ms: i64,
    /// How long an operation waits for a contended account lock.
    pub lock_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cashback_rate: dec!(0.02),
            cashback_delay_ms: MILLISECONDS_IN_ONE_DAY,
            lock_timeout_ms: 5_000,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cashback_rate < Decimal::ZERO || self.cashback_rate > Decimal::ONE {
            return Err(LedgerError::Config(format!(
                "cashback_rate must be within [0, 1], got {}",
                self.cashback_rate
            )));
        }
        if self.cashback_delay_ms < 0 {
            return Err(LedgerError::Config(format!(
                "cashback_delay_ms must not be negative, got {}",
                self.cashback_delay_ms
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(LedgerError::Config(
                "lock_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cashback_policy(&self) -> CashbackPolicy {
        CashbackPolicy {
            rate: self.cashback_rate,
            delay_ms: self.cashback_delay_ms,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
