use crate::domain::model::{Datatype, Rank};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A group of cooperating ranks that execute collectives in lockstep.
///
/// Every rank must enter each collective call, in the same order, for the
/// group to make progress.
#[async_trait]
pub trait Communicator: Send + Sync {
    fn rank(&self) -> Rank;

    fn size(&self) -> usize;

    /// Element count a single transmission may not exceed.
    fn count_ceiling(&self) -> usize;

    /// Broadcasts `buf` from `root`. Every rank passes a buffer of the same
    /// length; on return, non-root buffers hold the root's bytes.
    async fn bcast(&self, buf: &mut [u8], datatype: Datatype, root: Rank) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn ranks(&self) -> usize;
    fn root(&self) -> Rank;
    fn data_size(&self) -> usize;
    fn max_chunk_len(&self) -> i64;
    fn count_ceiling(&self) -> usize;
}
