pub mod chunked;
pub mod engine;
pub mod plan;
pub mod topology;

pub use crate::domain::model::{BcastSource, Datatype, Element, Rank, INT_MAX};
pub use crate::domain::ports::{Communicator, ConfigProvider};
pub use crate::utils::error::Result;
