use crate::core::chunked::{chunked_bcast_obj, default_max_buf_len};
use crate::domain::model::{Rank, RankInfo};
use crate::domain::ports::Communicator;
use crate::utils::error::{ChunkcastError, Result};
use crate::utils::validation::validate_non_empty_string;

/// Works out where the calling rank sits relative to the hosts of its group.
///
/// Each rank takes a turn as root and broadcasts its hostname, so every rank
/// ends up with the same host list and computes a consistent answer.
pub async fn init_ranks<C>(comm: &C, hostname: &str) -> Result<RankInfo>
where
    C: Communicator + ?Sized,
{
    let max_buf_len = default_max_buf_len(comm);
    let mut hosts = Vec::with_capacity(comm.size());
    for root in 0..comm.size() {
        let mine = (comm.rank() == root).then(|| hostname.to_string());
        hosts.push(chunked_bcast_obj(mine, comm, max_buf_len, root).await?);
    }

    for host in &hosts {
        validate_non_empty_string("hostname", host)?;
    }

    let info = rank_info_from_hosts(&hosts, comm.rank())?;
    tracing::debug!(?info, "rank topology resolved");
    Ok(info)
}

/// Hosts are numbered in order of first appearance.
pub fn rank_info_from_hosts(hosts: &[String], rank: Rank) -> Result<RankInfo> {
    let own = hosts.get(rank).ok_or_else(|| ChunkcastError::ProcessingError {
        message: format!("rank {} is outside a host list of {}", rank, hosts.len()),
    })?;

    let mut distinct: Vec<&str> = Vec::new();
    for host in hosts {
        if !distinct.contains(&host.as_str()) {
            distinct.push(host);
        }
    }

    let inter_rank = distinct
        .iter()
        .position(|h| *h == own.as_str())
        .unwrap_or_default();

    Ok(RankInfo {
        global_rank: rank,
        intra_rank: hosts[..rank].iter().filter(|h| *h == own).count(),
        intra_size: hosts.iter().filter(|h| *h == own).count(),
        inter_rank,
        inter_size: distinct.len(),
    })
}
