use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-instrument trading parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSpec {
    /// Take-profit offset from entry, in price units.
    pub take_profit: f64,
    /// Monetary value of one price unit per contract.
    pub multiplier: f64,
}

impl InstrumentSpec {
    pub fn new(take_profit: f64, multiplier: f64) -> Self {
        Self {
            take_profit,
            multiplier,
        }
    }

    /// Check both parameters are finite and strictly positive.
    pub fn validate(&self, symbol: &str) -> Result<(), InstrumentError> {
        if !(self.take_profit.is_finite() && self.take_profit > 0.0) {
            return Err(InstrumentError::InvalidTakeProfit {
                symbol: symbol.to_string(),
                value: self.take_profit,
            });
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(InstrumentError::InvalidMultiplier {
                symbol: symbol.to_string(),
                value: self.multiplier,
            });
        }
        Ok(())
    }
}

/// Instrument configuration table: symbol → spec.
///
/// Lookups never fall back to a default spec; an unconfigured symbol is an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct InstrumentTable {
    specs: BTreeMap<String, InstrumentSpec>,
}

impl InstrumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three contracts the strategy was first traded on.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.insert("M2505", InstrumentSpec::new(1.0, 10.0));
        table.insert("RU2505", InstrumentSpec::new(5.0, 10.0));
        table.insert("MA2505", InstrumentSpec::new(1.0, 10.0));
        table
    }

    pub fn insert(&mut self, symbol: impl Into<String>, spec: InstrumentSpec) {
        self.specs.insert(symbol.into(), spec);
    }

    pub fn get(&self, symbol: &str) -> Result<InstrumentSpec, InstrumentError> {
        self.specs
            .get(symbol)
            .copied()
            .ok_or_else(|| InstrumentError::UnknownInstrument {
                symbol: symbol.to_string(),
            })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.specs.contains_key(symbol)
    }

    /// Configured symbols in sorted order.
    pub fn symbols(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    pub fn validate(&self) -> Result<(), InstrumentError> {
        for (symbol, spec) in &self.specs {
            spec.validate(symbol)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InstrumentError {
    #[error("unknown instrument '{symbol}': no take-profit/multiplier configured")]
    UnknownInstrument { symbol: String },

    #[error("instrument '{symbol}': take_profit must be finite and > 0, got {value}")]
    InvalidTakeProfit { symbol: String, value: f64 },

    #[error("instrument '{symbol}': multiplier must be finite and > 0, got {value}")]
    InvalidMultiplier { symbol: String, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_traded_contracts() {
        let table = InstrumentTable::with_defaults();
        assert_eq!(table.get("RU2505").unwrap().take_profit, 5.0);
        assert_eq!(table.get("M2505").unwrap().multiplier, 10.0);
        assert_eq!(table.symbols(), vec!["M2505", "MA2505", "RU2505"]);
    }

    #[test]
    fn unknown_instrument_is_error() {
        let table = InstrumentTable::with_defaults();
        let err = table.get("XX9999").unwrap_err();
        assert_eq!(
            err,
            InstrumentError::UnknownInstrument {
                symbol: "XX9999".into()
            }
        );
    }

    #[test]
    fn validate_rejects_non_positive_values() {
        assert!(InstrumentSpec::new(0.0, 10.0).validate("A").is_err());
        assert!(InstrumentSpec::new(1.0, -1.0).validate("A").is_err());
        assert!(InstrumentSpec::new(f64::NAN, 10.0).validate("A").is_err());
        assert!(InstrumentSpec::new(1.0, 10.0).validate("A").is_ok());
    }
}
