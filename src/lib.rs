pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalCommunicator, LocalGroup};
pub use crate::core::{
    chunked::{chunked_bcast, chunked_bcast_obj},
    engine::{BcastEngine, BcastScenario},
    topology::init_ranks,
};
pub use domain::model::{BcastSource, TransportLimits, INT_MAX};
pub use domain::ports::Communicator;
pub use utils::error::{ChunkcastError, Result};
