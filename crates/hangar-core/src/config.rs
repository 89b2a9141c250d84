// Copyright [2026] [Joseph Verdicchio]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 Joseph Verdicchio and Hangar Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deployment parameters for a [`crate::Hangar`].
//!
//! Loaded from a JSON file, then optionally overridden from `HANGAR_*`
//! environment variables, then validated.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::garage::{DEFAULT_TRAINING_DURATION, MAX_BATCH_SIZE};
use crate::types::{hex_hash_opt, Address, BlockHeight, Hash32, TokenId, Wei};

pub const ENV_MAX_SUPPLY: &str = "HANGAR_MAX_SUPPLY";
pub const ENV_UNIT_PRICE: &str = "HANGAR_UNIT_PRICE";
pub const ENV_TRAINING_DURATION: &str = "HANGAR_TRAINING_DURATION";
pub const ENV_BASE_URI: &str = "HANGAR_BASE_URI";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_start_token_id() -> TokenId {
    1
}

fn default_training_duration() -> BlockHeight {
    DEFAULT_TRAINING_DURATION
}

fn default_max_batch() -> usize {
    MAX_BATCH_SIZE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HangarConfig {
    pub name: String,
    pub symbol: String,
    /// Address the ledger itself is known by; pilots from it are refused.
    pub ledger_address: Address,
    pub issuer: Address,
    #[serde(default)]
    pub admin: Option<Address>,
    pub max_supply: u64,
    pub unit_price: Wei,
    #[serde(default = "default_start_token_id")]
    pub start_token_id: TokenId,
    #[serde(default = "default_training_duration")]
    pub training_duration: BlockHeight,
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
    #[serde(default)]
    pub base_uri: String,
    #[serde(default, with = "hex_hash_opt")]
    pub allowlist_root: Option<Hash32>,
    #[serde(default, with = "hex_hash_opt")]
    pub waitlist_root: Option<Hash32>,
}

impl HangarConfig {
    /// Minimal config with defaults for everything optional.
    pub fn new(ledger_address: Address, issuer: Address, max_supply: u64, unit_price: Wei) -> Self {
        Self {
            name: "Hangar".to_string(),
            symbol: "HNGR".to_string(),
            ledger_address,
            issuer,
            admin: None,
            max_supply,
            unit_price,
            start_token_id: default_start_token_id(),
            training_duration: DEFAULT_TRAINING_DURATION,
            max_batch: MAX_BATCH_SIZE,
            base_uri: String::new(),
            allowlist_root: None,
            waitlist_root: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let payload = fs::read(path)?;
        let config: Self = serde_json::from_slice(&payload)?;
        Ok(config)
    }

    /// [`Self::load`], then process-environment overrides, then validation.
    pub fn from_path_and_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `HANGAR_*` overrides looked up through `lookup`. Unset keys are skipped;
    /// set but unparsable values are an error rather than silently ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = read_override::<u64, _>(&lookup, ENV_MAX_SUPPLY)? {
            self.max_supply = v;
        }
        if let Some(v) = read_override::<Wei, _>(&lookup, ENV_UNIT_PRICE)? {
            self.unit_price = v;
        }
        if let Some(v) = read_override::<BlockHeight, _>(&lookup, ENV_TRAINING_DURATION)? {
            self.training_duration = v;
        }
        if let Some(raw) = lookup(ENV_BASE_URI) {
            self.base_uri = raw;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_zero() {
            return Err(ConfigError::Invalid("issuer must be non-zero".to_string()));
        }
        if self.ledger_address.is_zero() {
            return Err(ConfigError::Invalid(
                "ledger_address must be non-zero".to_string(),
            ));
        }
        if self.admin.is_some_and(|admin| admin.is_zero()) {
            return Err(ConfigError::Invalid("admin must be non-zero".to_string()));
        }
        if self.max_batch == 0 || self.max_batch > MAX_BATCH_SIZE {
            return Err(ConfigError::Invalid(format!(
                "max_batch must be in 1..={MAX_BATCH_SIZE}"
            )));
        }
        if self.start_token_id.checked_add(self.max_supply).is_none() {
            return Err(ConfigError::Invalid(
                "token id range overflows".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_override<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::Invalid(format!("{key} is not a valid number: {raw:?}")))
}
