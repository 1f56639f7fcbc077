use crate::domain::model::{Datatype, Rank, TransportLimits};
use crate::domain::ports::Communicator;
use crate::utils::error::{ChunkcastError, Result};
use crate::utils::validation::validate_root;
use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Mutex};

struct Published {
    root: Rank,
    datatype: Datatype,
    bytes: Vec<u8>,
}

struct Shared {
    size: usize,
    limits: TransportLimits,
    barrier: Barrier,
    slot: Mutex<Option<Published>>,
}

/// In-process group of ranks sharing one broadcast rendezvous.
pub struct LocalGroup;

impl LocalGroup {
    /// Creates `size` communicators, one per rank, ordered by rank.
    pub fn new(size: usize, limits: TransportLimits) -> Result<Vec<LocalCommunicator>> {
        if size == 0 {
            return Err(ChunkcastError::InvalidConfigValueError {
                field: "ranks".to_string(),
                value: size.to_string(),
                reason: "A group needs at least one rank".to_string(),
            });
        }

        let shared = Arc::new(Shared {
            size,
            limits,
            barrier: Barrier::new(size),
            slot: Mutex::new(None),
        });

        Ok((0..size)
            .map(|rank| LocalCommunicator {
                rank,
                shared: Arc::clone(&shared),
                transmissions: AtomicUsize::new(0),
            })
            .collect())
    }

    /// Runs `body` once per rank as its own task and collects the results in rank order.
    pub async fn run<F, Fut, R>(size: usize, limits: TransportLimits, body: F) -> Result<Vec<Result<R>>>
    where
        F: Fn(LocalCommunicator) -> Fut,
        Fut: Future<Output = Result<R>> + Send + 'static,
        R: Send + 'static,
    {
        let handles: Vec<_> = Self::new(size, limits)?
            .into_iter()
            .map(|comm| tokio::spawn(body(comm)))
            .collect();

        let mut results = Vec::with_capacity(size);
        for handle in handles {
            results.push(handle.await?);
        }
        Ok(results)
    }
}

pub struct LocalCommunicator {
    rank: Rank,
    shared: Arc<Shared>,
    transmissions: AtomicUsize,
}

impl LocalCommunicator {
    /// Broadcast rounds this rank has completed.
    pub fn transmissions(&self) -> usize {
        self.transmissions.load(Ordering::Relaxed)
    }

    fn check_message(&self, buf: &[u8], datatype: Datatype, root: Rank) -> Result<()> {
        validate_root(root, self.shared.size)?;

        if buf.len() % datatype.size() != 0 {
            return Err(ChunkcastError::TransportError {
                message: format!(
                    "buffer of {} bytes is not a whole number of {} elements",
                    buf.len(),
                    datatype
                ),
            });
        }

        let count = buf.len() / datatype.size();
        let ceiling = self.shared.limits.count_ceiling;
        if count > ceiling {
            return Err(ChunkcastError::MessageTooLarge { count, ceiling });
        }
        Ok(())
    }

    async fn receive(&self, buf: &mut [u8], datatype: Datatype, root: Rank) -> Result<()> {
        let slot = self.shared.slot.lock().await;
        let published = slot.as_ref().ok_or_else(|| ChunkcastError::TransportError {
            message: format!("rank {} found no message from root {}", self.rank, root),
        })?;

        if published.root != root {
            return Err(ChunkcastError::TransportError {
                message: format!(
                    "rank {} expected root {} but rank {} broadcast",
                    self.rank, root, published.root
                ),
            });
        }
        if published.datatype != datatype {
            return Err(ChunkcastError::DatatypeMismatch {
                expected: datatype.to_string(),
                received: published.datatype.to_string(),
            });
        }
        if published.bytes.len() != buf.len() {
            return Err(ChunkcastError::TransportError {
                message: format!(
                    "rank {} posted {} bytes but root sent {}",
                    self.rank,
                    buf.len(),
                    published.bytes.len()
                ),
            });
        }

        buf.copy_from_slice(&published.bytes);
        Ok(())
    }
}

#[async_trait]
impl Communicator for LocalCommunicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn count_ceiling(&self) -> usize {
        self.shared.limits.count_ceiling
    }

    async fn bcast(&self, buf: &mut [u8], datatype: Datatype, root: Rank) -> Result<()> {
        // Ranks that agree on the arguments agree on these checks too.
        self.check_message(buf, datatype, root)?;

        if self.rank == root {
            *self.shared.slot.lock().await = Some(Published {
                root,
                datatype,
                bytes: buf.to_vec(),
            });
        }

        self.shared.barrier.wait().await;

        let received = if self.rank == root {
            Ok(())
        } else {
            self.receive(buf, datatype, root).await
        };

        // Everyone must leave the round even when the copy failed. The slot stays
        // filled until the next root overwrites it after this barrier.
        self.shared.barrier.wait().await;

        self.transmissions.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(rank = self.rank, root, bytes = buf.len(), "bcast round done");
        received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bcast_copies_root_bytes() {
        let results = LocalGroup::run(3, TransportLimits::default(), |comm| async move {
            let mut buf = if comm.rank() == 1 {
                vec![7u8, 8, 9]
            } else {
                vec![0u8; 3]
            };
            comm.bcast(&mut buf, Datatype::U8, 1).await?;
            Ok(buf)
        })
        .await
        .unwrap();

        for result in results {
            assert_eq!(result.unwrap(), vec![7, 8, 9]);
        }
    }

    #[tokio::test]
    async fn test_bcast_rejects_oversized_message() {
        let limits = TransportLimits::new(4).unwrap();
        let results = LocalGroup::run(2, limits, |comm| async move {
            let mut buf = vec![0u8; 5];
            comm.bcast(&mut buf, Datatype::U8, 0).await
        })
        .await
        .unwrap();

        for result in results {
            assert!(matches!(
                result,
                Err(ChunkcastError::MessageTooLarge {
                    count: 5,
                    ceiling: 4
                })
            ));
        }
    }

    #[tokio::test]
    async fn test_bcast_counts_elements_not_bytes() {
        let limits = TransportLimits::new(4).unwrap();
        let results = LocalGroup::run(2, limits, |comm| async move {
            let mut buf = vec![1u8; 4 * Datatype::F64.size()];
            comm.bcast(&mut buf, Datatype::F64, 0).await
        })
        .await
        .unwrap();

        assert!(results.into_iter().all(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn test_length_mismatch_does_not_hang() {
        let results = LocalGroup::run(2, TransportLimits::default(), |comm| async move {
            let mut buf = if comm.rank() == 0 {
                vec![1u8; 4]
            } else {
                vec![0u8; 2]
            };
            comm.bcast(&mut buf, Datatype::U8, 0).await?;
            Ok(comm.transmissions())
        })
        .await
        .unwrap();

        assert_eq!(*results[0].as_ref().unwrap(), 1);
        assert!(matches!(
            results[1],
            Err(ChunkcastError::TransportError { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_alternating_roots_keep_every_message() {
        let roots = [0usize, 1, 2, 0, 2, 1];
        for _ in 0..20 {
            let results = LocalGroup::run(3, TransportLimits::default(), move |comm| async move {
                let mut seen = Vec::with_capacity(roots.len());
                for (round, root) in roots.into_iter().enumerate() {
                    let mut buf = if comm.rank() == root {
                        vec![root as u8, round as u8]
                    } else {
                        vec![0u8; 2]
                    };
                    comm.bcast(&mut buf, Datatype::U8, root).await?;
                    seen.push(buf);
                }
                Ok(seen)
            })
            .await
            .unwrap();

            for result in results {
                let seen = result.unwrap();
                for (round, root) in roots.into_iter().enumerate() {
                    assert_eq!(seen[round], vec![root as u8, round as u8]);
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_root_change_between_datatypes() {
        let results = LocalGroup::run(3, TransportLimits::default(), |comm| async move {
            let mut words = if comm.rank() == 0 { 7u64.to_le_bytes().to_vec() } else { vec![0u8; 8] };
            comm.bcast(&mut words, Datatype::U64, 0).await?;

            let mut bytes = if comm.rank() == 2 { vec![9u8] } else { vec![0u8] };
            comm.bcast(&mut bytes, Datatype::U8, 2).await?;
            Ok((words, bytes))
        })
        .await
        .unwrap();

        for result in results {
            let (words, bytes) = result.unwrap();
            assert_eq!(words, 7u64.to_le_bytes().to_vec());
            assert_eq!(bytes, vec![9]);
        }
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(LocalGroup::new(0, TransportLimits::default()).is_err());
    }
}
