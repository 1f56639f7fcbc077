use chunkcast::domain::model::RankInfo;
use chunkcast::{
    chunked_bcast_obj, init_ranks, ChunkcastError, Communicator, LocalGroup, TransportLimits,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TrainingState {
    epoch: u32,
    learning_rate: f64,
    layers: Vec<String>,
    shapes: HashMap<String, Vec<usize>>,
}

fn sample_state() -> TrainingState {
    let mut shapes = HashMap::new();
    shapes.insert("fc1".to_string(), vec![784, 128]);
    shapes.insert("fc2".to_string(), vec![128, 10]);
    TrainingState {
        epoch: 12,
        learning_rate: 0.05,
        layers: vec!["fc1".to_string(), "relu".to_string(), "fc2".to_string()],
        shapes,
    }
}

#[tokio::test]
async fn test_object_reaches_every_rank() {
    let results = LocalGroup::run(4, TransportLimits::default(), |comm| async move {
        let obj = (comm.rank() == 0).then(sample_state);
        // tiny chunks force many rounds over the serialized bytes
        chunked_bcast_obj(obj, &comm, 3, 0).await
    })
    .await
    .unwrap();

    for result in results {
        assert_eq!(result.unwrap(), sample_state());
    }
}

#[tokio::test]
async fn test_object_from_nonzero_root() {
    let results = LocalGroup::run(3, TransportLimits::default(), |comm| async move {
        let obj = (comm.rank() == 2).then(|| vec![1u64, 2, 3]);
        chunked_bcast_obj(obj, &comm, 1024, 2).await
    })
    .await
    .unwrap();

    for result in results {
        assert_eq!(result.unwrap(), vec![1, 2, 3]);
    }
}

#[tokio::test]
async fn test_object_chunk_length_at_ceiling_fails() {
    let limits = TransportLimits::new(32).unwrap();
    let results = LocalGroup::run(2, limits, |comm| async move {
        let obj = (comm.rank() == 0).then(|| "payload".to_string());
        chunked_bcast_obj(obj, &comm, 32, 0).await
    })
    .await
    .unwrap();

    for result in results {
        assert!(matches!(
            result,
            Err(ChunkcastError::InvalidChunkLength { value: 32, .. })
        ));
    }
}

#[tokio::test]
async fn test_value_on_non_root_is_rejected() {
    let comms = LocalGroup::new(2, TransportLimits::default()).unwrap();
    let err = chunked_bcast_obj(Some(1u8), &comms[1], 8, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ChunkcastError::SourceMismatch { rank: 1, root: 0, .. }));
}

#[test]
fn test_init_ranks_groups_ranks_by_host() {
    let hosts = ["node-a", "node-a", "node-b", "node-a"];
    let results = tokio_test::block_on(LocalGroup::run(
        hosts.len(),
        TransportLimits::new(16).unwrap(),
        move |comm| async move { init_ranks(&comm, hosts[comm.rank()]).await },
    ))
    .unwrap();

    let infos: Vec<RankInfo> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(
        infos[3],
        RankInfo {
            global_rank: 3,
            intra_rank: 2,
            intra_size: 3,
            inter_rank: 0,
            inter_size: 2,
        }
    );
    assert_eq!(infos[2].inter_rank, 1);
    assert_eq!(infos[2].intra_size, 1);
    assert!(infos.iter().all(|info| info.inter_size == 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_init_ranks_repeated_in_parallel() {
    let hosts = ["node-a", "node-b", "node-a", "node-b"];
    for _ in 0..25 {
        let results = LocalGroup::run(hosts.len(), TransportLimits::default(), move |comm| async move {
            init_ranks(&comm, hosts[comm.rank()]).await
        })
        .await
        .unwrap();

        for (rank, result) in results.into_iter().enumerate() {
            let info = result.unwrap();
            assert_eq!(info.global_rank, rank);
            assert_eq!(info.inter_rank, rank % 2);
            assert_eq!(info.intra_rank, rank / 2);
            assert_eq!(info.intra_size, 2);
            assert_eq!(info.inter_size, 2);
        }
    }
}

#[test]
fn test_init_ranks_rejects_empty_hostname() {
    let results = tokio_test::block_on(LocalGroup::run(
        2,
        TransportLimits::default(),
        |comm| async move {
            let name = if comm.rank() == 0 { "node-a" } else { "" };
            init_ranks(&comm, name).await
        },
    ))
    .unwrap();

    assert!(results.iter().all(|r| r.is_err()));
}
