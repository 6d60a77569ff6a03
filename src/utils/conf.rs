use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::logger::TracingMode;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Consensus {
    /// Milliseconds between two blocks
    pub slot_duration: u64,
}

/// Contracts and accounts present at height 0.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GenesisConf {
    pub admin: String,
    pub token_contract: String,
    pub sale_contract: String,
    /// Whole tokens, credited to the admin
    pub total_supply: u64,
    /// Native base units asked for one token base unit
    pub token_price: u64,
    /// Whole native units per account
    pub native_balances: BTreeMap<String, u64>,
}

pub type SharedConf = Arc<Conf>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Conf {
    pub id: String,
    pub rest: String,
    pub run_rest_server: bool,
    pub log_format: TracingMode,
    pub consensus: Consensus,
    pub genesis: GenesisConf,
}

impl Conf {
    pub fn new(config_file: Option<String>, rest: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("conf_defaults.ron"),
            FileFormat::Ron,
        ));
        // Priority order: defaults, config file, then environment variables, then CLI
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::with_name(&config_file).required(false));
        }
        let s = builder
            .add_source(
                Environment::with_prefix("zamp")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("rest", rest)?
            .build()?;

        s.try_deserialize()
    }

    pub fn new_shared(
        config_file: Option<String>,
        rest: Option<String>,
    ) -> Result<SharedConf, ConfigError> {
        Self::new(config_file, rest).map(Arc::new)
    }
}
