use crate::adapters::LocalGroup;
use crate::core::chunked::chunked_bcast;
use crate::domain::model::{BcastReport, BcastSource, ChunkHeader, Datatype, Rank, TransportLimits};
use crate::domain::ports::{Communicator, ConfigProvider};
use crate::utils::error::{ChunkcastError, Result};
use crate::utils::monitor::SystemMonitor;
use crate::utils::validation::{validate_chunk_length, validate_positive_number, validate_root};
use std::time::Instant;

/// One broadcast run over a local group: rank `root` sends `0..data_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BcastScenario {
    pub ranks: usize,
    pub root: Rank,
    pub data_size: usize,
    pub max_chunk_len: i64,
}

impl BcastScenario {
    pub fn from_config<P: ConfigProvider + ?Sized>(config: &P) -> Self {
        Self {
            ranks: config.ranks(),
            root: config.root(),
            data_size: config.data_size(),
            max_chunk_len: config.max_chunk_len(),
        }
    }
}

pub struct BcastEngine {
    limits: TransportLimits,
    monitor: SystemMonitor,
}

impl BcastEngine {
    pub fn new(limits: TransportLimits) -> Self {
        Self::new_with_monitoring(limits, false)
    }

    pub fn new_with_monitoring(limits: TransportLimits, monitor_enabled: bool) -> Self {
        Self {
            limits,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Builds the transport limits from the configured ceiling.
    pub fn from_config<P: ConfigProvider + ?Sized>(config: &P, monitor_enabled: bool) -> Result<Self> {
        let limits = TransportLimits::new(config.count_ceiling())?;
        Ok(Self::new_with_monitoring(limits, monitor_enabled))
    }

    pub fn limits(&self) -> TransportLimits {
        self.limits
    }

    /// Broadcasts the scenario's sequence and checks every rank received it intact.
    pub async fn run(&self, scenario: &BcastScenario) -> Result<BcastReport> {
        validate_positive_number("ranks", scenario.ranks, 1)?;
        validate_root(scenario.root, scenario.ranks)?;
        let chunk_len = validate_chunk_length(scenario.max_chunk_len, self.limits.count_ceiling)?;

        let total_chunks = ChunkHeader::new(scenario.data_size, chunk_len, Datatype::I64).total_chunks;
        tracing::info!(
            "Broadcasting {} elements from rank {} to {} ranks in {} chunks of up to {}",
            scenario.data_size,
            scenario.root,
            scenario.ranks,
            total_chunks,
            chunk_len
        );
        self.monitor.record_phase("Before broadcast", 0);

        let started = Instant::now();
        let BcastScenario {
            ranks,
            root,
            data_size,
            max_chunk_len,
        } = *scenario;

        let results = LocalGroup::run(ranks, self.limits, move |comm| async move {
            let source = BcastSource::for_rank(comm.rank(), root, || reference_sequence(data_size));
            let received = chunked_bcast(source, &comm, max_chunk_len, root).await?;
            verify_sequence(comm.rank(), &received, data_size)?;
            Ok(comm.transmissions())
        })
        .await?;
        let elapsed = started.elapsed();

        for (rank, result) in results.into_iter().enumerate() {
            let rounds = result?;
            tracing::debug!("rank {} verified after {} bcast rounds", rank, rounds);
        }

        let payload_bytes = data_size * ranks * Datatype::I64.size();
        self.monitor.record_phase("After broadcast", payload_bytes);
        self.monitor.log_final_stats();
        tracing::info!("All {} ranks verified in {:?}", ranks, elapsed);

        Ok(BcastReport {
            ranks,
            root,
            data_size,
            max_chunk_len: chunk_len,
            total_chunks,
            max_chunk_bytes: chunk_len.min(data_size) * Datatype::I64.size(),
            peak_memory_mb: self.monitor.peak_memory_mb(),
            elapsed,
        })
    }
}

fn reference_sequence(data_size: usize) -> Vec<i64> {
    (0..data_size as i64).collect()
}

fn verify_sequence(rank: Rank, received: &[i64], data_size: usize) -> Result<()> {
    if received.len() != data_size {
        return Err(ChunkcastError::ProcessingError {
            message: format!(
                "rank {} received {} elements, expected {}",
                rank,
                received.len(),
                data_size
            ),
        });
    }
    if let Some((index, value)) = received
        .iter()
        .enumerate()
        .find(|(index, value)| **value != *index as i64)
    {
        return Err(ChunkcastError::ProcessingError {
            message: format!(
                "rank {} holds {} at index {}, expected {}",
                rank, value, index, index
            ),
        });
    }
    Ok(())
}
