pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{TransportLimits, INT_MAX};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_chunk_length, validate_positive_number, validate_root, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "chunkcast")]
#[command(about = "Broadcast a sequence across a local rank group in bounded chunks")]
pub struct CliConfig {
    #[arg(long, default_value = "4")]
    pub ranks: usize,

    #[arg(long, default_value = "0")]
    pub root: usize,

    #[arg(long, default_value = "355678")]
    pub data_size: usize,

    #[arg(long, default_value = "2378", allow_negative_numbers = true)]
    pub max_chunk_len: i64,

    #[arg(long, default_value_t = INT_MAX, help = "Element count ceiling of a single transmission")]
    pub ceiling: usize,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage around the broadcast")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn ranks(&self) -> usize {
        self.ranks
    }

    fn root(&self) -> usize {
        self.root
    }

    fn data_size(&self) -> usize {
        self.data_size
    }

    fn max_chunk_len(&self) -> i64 {
        self.max_chunk_len
    }

    fn count_ceiling(&self) -> usize {
        self.ceiling
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("ranks", self.ranks, 1)?;
        TransportLimits::new(self.ceiling)?;
        validate_root(self.root, self.ranks)?;
        validate_chunk_length(self.max_chunk_len, self.ceiling)?;
        Ok(())
    }
}
