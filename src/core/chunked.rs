use crate::core::plan::ChunkPlan;
use crate::domain::model::{
    decode_elements, encode_elements, BcastSource, ChunkHeader, Datatype, Element, Rank,
    DEFAULT_MAX_BUF_LEN,
};
use crate::domain::ports::Communicator;
use crate::utils::error::{ChunkcastError, Result};
use crate::utils::validation::{validate_chunk_length, validate_root};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Broadcasts the root's sequence in chunks of at most `max_chunk_len` elements.
///
/// The root passes [`BcastSource::Source`] and gets its data back; every other
/// rank passes [`BcastSource::NotSource`] and receives a copy. A fixed-size
/// header goes out first so receivers know the length and chunk count.
///
/// `max_chunk_len` must satisfy `0 < max_chunk_len < comm.count_ceiling()`.
/// Argument errors are reported before anything is transmitted, but a rank that
/// fails them leaves its peers waiting in the next collective, exactly like a
/// rank that never calls it.
pub async fn chunked_bcast<T, C>(
    source: BcastSource<T>,
    comm: &C,
    max_chunk_len: i64,
    root: Rank,
) -> Result<Vec<T>>
where
    T: Element,
    C: Communicator + ?Sized,
{
    let max_chunk_len = validate_chunk_length(max_chunk_len, comm.count_ceiling())?;
    validate_root(root, comm.size())?;
    check_source(&source, comm.rank(), root)?;

    let mut header_bytes = match &source {
        BcastSource::Source(data) => ChunkHeader::new(data.len(), max_chunk_len, T::DATATYPE).encode(),
        BcastSource::NotSource => vec![0u8; ChunkHeader::WORDS * Datatype::U64.size()],
    };
    comm.bcast(&mut header_bytes, Datatype::U64, root).await?;
    let header = ChunkHeader::decode(&header_bytes)?;

    tracing::debug!(
        rank = comm.rank(),
        root,
        total_len = header.total_len,
        total_chunks = header.total_chunks,
        max_chunk_len = header.max_chunk_len,
        "chunked bcast started"
    );

    match source {
        BcastSource::Source(data) => {
            for range in ChunkPlan::from_header(&header) {
                let mut chunk = encode_elements(&data[range]);
                comm.bcast(&mut chunk, T::DATATYPE, root).await?;
            }
            Ok(data)
        }
        BcastSource::NotSource => receive_chunks(&header, comm, root).await,
    }
}

async fn receive_chunks<T, C>(header: &ChunkHeader, comm: &C, root: Rank) -> Result<Vec<T>>
where
    T: Element,
    C: Communicator + ?Sized,
{
    // On a datatype mismatch the rank still takes part in every round so the
    // rest of the group is not left blocked; it reports the error afterwards.
    let matches = header.datatype == T::DATATYPE;
    let width = header.datatype.size();

    let mut received: Vec<T> = Vec::with_capacity(if matches { header.total_len } else { 0 });
    let mut chunk = Vec::new();
    for range in ChunkPlan::from_header(header) {
        chunk.clear();
        chunk.resize(range.len() * width, 0u8);
        comm.bcast(&mut chunk, header.datatype, root).await?;
        if matches {
            decode_elements(&chunk, &mut received);
        }
    }

    if !matches {
        return Err(ChunkcastError::DatatypeMismatch {
            expected: T::DATATYPE.to_string(),
            received: header.datatype.to_string(),
        });
    }
    Ok(received)
}

fn check_source<T>(source: &BcastSource<T>, rank: Rank, root: Rank) -> Result<()> {
    let message = match (rank == root, source.is_source()) {
        (true, false) => "root rank passed no data",
        (false, true) => "non-root rank passed data",
        _ => return Ok(()),
    };
    Err(ChunkcastError::SourceMismatch {
        rank,
        root,
        message: message.to_string(),
    })
}

/// Largest default object chunk the communicator accepts.
pub fn default_max_buf_len<C: Communicator + ?Sized>(comm: &C) -> i64 {
    let below_ceiling = i64::try_from(comm.count_ceiling().saturating_sub(1)).unwrap_or(i64::MAX);
    DEFAULT_MAX_BUF_LEN.min(below_ceiling)
}

/// Broadcasts any serializable value from the root, chunked as JSON bytes.
///
/// The root passes `Some(value)` and gets it back untouched; every other rank
/// passes `None` and receives the deserialized copy.
pub async fn chunked_bcast_obj<V, C>(
    obj: Option<V>,
    comm: &C,
    max_buf_len: i64,
    root: Rank,
) -> Result<V>
where
    V: Serialize + DeserializeOwned,
    C: Communicator + ?Sized,
{
    let rank = comm.rank();
    let (local, source) = match obj {
        Some(value) if rank == root => {
            let bytes = serde_json::to_vec(&value)?;
            (Some(value), BcastSource::Source(bytes))
        }
        Some(_) => {
            return Err(ChunkcastError::SourceMismatch {
                rank,
                root,
                message: "non-root rank passed a value".to_string(),
            })
        }
        None => (None, BcastSource::NotSource),
    };

    let bytes = chunked_bcast(source, comm, max_buf_len, root).await?;
    match local {
        Some(value) => Ok(value),
        None => Ok(serde_json::from_slice(&bytes)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalGroup;
    use crate::domain::model::{TransportLimits, INT_MAX};

    #[tokio::test]
    async fn test_single_rank_returns_its_data() {
        let comms = LocalGroup::new(1, TransportLimits::default()).unwrap();
        let out = chunked_bcast(BcastSource::Source(vec![1.5f32, 2.5]), &comms[0], 1, 0)
            .await
            .unwrap();
        assert_eq!(out, vec![1.5, 2.5]);
        assert_eq!(comms[0].transmissions(), 3);
    }

    #[tokio::test]
    async fn test_rejects_before_transmitting() {
        let comms = LocalGroup::new(1, TransportLimits::default()).unwrap();
        for bad in [0, -1, INT_MAX as i64] {
            let err = chunked_bcast(BcastSource::Source(vec![1u8]), &comms[0], bad, 0)
                .await
                .unwrap_err();
            assert!(matches!(err, ChunkcastError::InvalidChunkLength { .. }));
        }
        assert_eq!(comms[0].transmissions(), 0);
    }

    #[tokio::test]
    async fn test_root_without_data_is_rejected() {
        let comms = LocalGroup::new(1, TransportLimits::default()).unwrap();
        let err = chunked_bcast::<u8, _>(BcastSource::NotSource, &comms[0], 4, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkcastError::SourceMismatch { rank: 0, .. }));
    }

    #[tokio::test]
    async fn test_root_out_of_range() {
        let comms = LocalGroup::new(2, TransportLimits::default()).unwrap();
        let err = chunked_bcast(BcastSource::Source(vec![1u8]), &comms[0], 4, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkcastError::InvalidRoot { root: 2, size: 2 }));
    }

    #[test]
    fn test_default_buf_len_respects_small_ceiling() {
        let comms = LocalGroup::new(1, TransportLimits::new(16).unwrap()).unwrap();
        assert_eq!(default_max_buf_len(&comms[0]), 15);

        let comms = LocalGroup::new(1, TransportLimits::default()).unwrap();
        assert_eq!(default_max_buf_len(&comms[0]), DEFAULT_MAX_BUF_LEN);
    }
}
