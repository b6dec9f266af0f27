//! Runtime configuration, read from the environment
use std::str::FromStr;

use crate::{error::ConfigError, proofs::MAX_CONFIDENCE, BigInt};

/// The local development chain
pub const LOCAL_CHAIN_ID: u64 = 31337;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// The confidential protocol deployment serving a chain, if there is one
pub fn confidential_protocol_id(chain_id: u64) -> Option<u64> {
    match chain_id {
        LOCAL_CHAIN_ID => Some(LOCAL_CHAIN_ID),
        SEPOLIA_CHAIN_ID => Some(1),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Bits of the ring modulus r; every tally is computed modulo r
    pub ring_bits: usize,
    /// Bits of each of the arithmetic-sequence multipliers used to find p and q
    pub modulus_bits: usize,
    /// Capsules per ballot proof; a forged proof passes with probability 2^-confidence
    pub proof_confidence: usize,
    pub chain_id: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring_bits: 16,
            modulus_bits: 64,
            proof_confidence: 128,
            chain_id: LOCAL_CHAIN_ID,
        }
    }
}

impl Config {
    /// Read `SURVEY_*` variables, falling back to the defaults for any that are unset
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            ring_bits: parse_var(&lookup, "SURVEY_RING_BITS", defaults.ring_bits)?,
            modulus_bits: parse_var(&lookup, "SURVEY_MODULUS_BITS", defaults.modulus_bits)?,
            proof_confidence: parse_var(
                &lookup,
                "SURVEY_PROOF_CONFIDENCE",
                defaults.proof_confidence,
            )?,
            chain_id: parse_var(&lookup, "SURVEY_CHAIN_ID", defaults.chain_id)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_bounds("ring_bits", self.ring_bits, 8, 32)?;
        check_bounds("modulus_bits", self.modulus_bits, 32, 96)?;
        check_bounds("proof_confidence", self.proof_confidence, 1, MAX_CONFIDENCE)?;
        // p = r^2 x + br + 1 and n = pq must not overflow
        if 3 * self.ring_bits + 2 * self.modulus_bits + 4 > BigInt::BITS {
            return Err(ConfigError::ParametersTooLarge {
                ring_bits: self.ring_bits,
                modulus_bits: self.modulus_bits,
            });
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Unparseable { var, value }),
    }
}

fn check_bounds(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfBounds {
            field,
            value: value as u64,
            min: min as u64,
            max: max as u64,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SURVEY_RING_BITS", "12"),
            ("SURVEY_MODULUS_BITS", " 48 "),
            ("SURVEY_PROOF_CONFIDENCE", "16"),
            ("SURVEY_CHAIN_ID", "11155111"),
        ]))
        .unwrap();
        assert_eq!(config.ring_bits, 12);
        assert_eq!(config.modulus_bits, 48);
        assert_eq!(config.proof_confidence, 16);
        assert_eq!(config.chain_id, SEPOLIA_CHAIN_ID);
    }

    #[test]
    fn test_rejects_garbage_and_out_of_bounds() {
        assert_eq!(
            Config::from_lookup(lookup(&[("SURVEY_RING_BITS", "many")])),
            Err(ConfigError::Unparseable {
                var: "SURVEY_RING_BITS",
                value: "many".to_string()
            })
        );
        assert!(matches!(
            Config::from_lookup(lookup(&[("SURVEY_PROOF_CONFIDENCE", "0")])),
            Err(ConfigError::OutOfBounds {
                field: "proof_confidence",
                ..
            })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[
                ("SURVEY_RING_BITS", "32"),
                ("SURVEY_MODULUS_BITS", "96")
            ])),
            Err(ConfigError::ParametersTooLarge { .. })
        ));
    }

    #[test]
    fn test_protocol_ids() {
        assert_eq!(confidential_protocol_id(LOCAL_CHAIN_ID), Some(31337));
        assert_eq!(confidential_protocol_id(SEPOLIA_CHAIN_ID), Some(1));
        assert_eq!(confidential_protocol_id(1), None);
    }
}
