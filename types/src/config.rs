use std::{borrow::Cow, path::Path};

use anyhow::Result;
use hex_literal::hex;
use serde::{Deserialize, Serialize};

use crate::{
    phase0::{
        containers::Fork,
        primitives::{Gwei, Version, H32},
    },
    preset::PresetName,
};

/// Configuration variables customizable at runtime.
///
/// Missing keys take their values from [`Config::default`], which matches mainnet apart from
/// `config_name`.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Meta
    pub config_name: Cow<'static, str>,
    pub preset_base: PresetName,

    // Genesis
    pub genesis_fork_version: Version,

    // Validator cycle
    #[serde(with = "serde_utils::string_or_native")]
    pub ejection_balance: Gwei,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Meta
            //
            // Use `default` as the default `config_name` and override it in `Config::mainnet`.
            config_name: Cow::Borrowed("default"),
            preset_base: PresetName::Mainnet,

            // Genesis
            genesis_fork_version: H32(hex!("00000000")),

            // Validator cycle
            ejection_balance: 16_000_000_000,
        }
    }
}

impl Config {
    #[must_use]
    pub fn mainnet() -> Self {
        Self {
            config_name: Cow::Borrowed("mainnet"),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn minimal() -> Self {
        Self {
            config_name: Cow::Borrowed("minimal"),
            preset_base: PresetName::Minimal,
            genesis_fork_version: H32(hex!("00000001")),
            ..Self::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = fs_err::read_to_string(path.as_ref())?;
        let config = serde_yaml::from_str(&yaml)?;
        Ok(config)
    }

    #[must_use]
    pub const fn genesis_fork(&self) -> Fork {
        Fork::genesis(self.genesis_fork_version)
    }
}
