use crate::utils::error::{ChunkcastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Position of a participant inside its group.
pub type Rank = usize;

/// Largest element count a single transmission may carry by default.
pub const INT_MAX: usize = i32::MAX as usize;

/// Default chunk size, in bytes, for object broadcasts.
pub const DEFAULT_MAX_BUF_LEN: i64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    U8,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
}

impl Datatype {
    pub fn size(self) -> usize {
        match self {
            Datatype::U8 => 1,
            Datatype::I32 | Datatype::U32 | Datatype::F32 => 4,
            Datatype::I64 | Datatype::U64 | Datatype::F64 => 8,
        }
    }

    fn code(self) -> u64 {
        match self {
            Datatype::U8 => 1,
            Datatype::I32 => 2,
            Datatype::I64 => 3,
            Datatype::U32 => 4,
            Datatype::U64 => 5,
            Datatype::F32 => 6,
            Datatype::F64 => 7,
        }
    }

    fn from_code(code: u64) -> Result<Self> {
        Ok(match code {
            1 => Datatype::U8,
            2 => Datatype::I32,
            3 => Datatype::I64,
            4 => Datatype::U32,
            5 => Datatype::U64,
            6 => Datatype::F32,
            7 => Datatype::F64,
            other => {
                return Err(ChunkcastError::TransportError {
                    message: format!("unknown datatype code {} in chunk header", other),
                })
            }
        })
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Datatype::U8 => "u8",
            Datatype::I32 => "i32",
            Datatype::I64 => "i64",
            Datatype::U32 => "u32",
            Datatype::U64 => "u64",
            Datatype::F32 => "f32",
            Datatype::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A fixed-width value that can travel through a [`Communicator`](crate::domain::ports::Communicator).
pub trait Element: Copy + Send + Sync + 'static {
    const DATATYPE: Datatype;

    fn write_le(&self, out: &mut [u8]);

    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dt:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATATYPE: Datatype = $dt;

                fn write_le(&self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_element! {
    u8 => Datatype::U8,
    i32 => Datatype::I32,
    i64 => Datatype::I64,
    u32 => Datatype::U32,
    u64 => Datatype::U64,
    f32 => Datatype::F32,
    f64 => Datatype::F64,
}

pub fn encode_elements<T: Element>(values: &[T]) -> Vec<u8> {
    let width = T::DATATYPE.size();
    let mut bytes = vec![0u8; values.len() * width];
    for (value, slot) in values.iter().zip(bytes.chunks_exact_mut(width)) {
        value.write_le(slot);
    }
    bytes
}

pub fn decode_elements<T: Element>(bytes: &[u8], out: &mut Vec<T>) {
    out.extend(bytes.chunks_exact(T::DATATYPE.size()).map(T::read_le));
}

/// What a rank contributes to a broadcast: the data at the root, nothing elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub enum BcastSource<T> {
    Source(Vec<T>),
    NotSource,
}

impl<T> BcastSource<T> {
    /// Builds the right variant for `rank`, keeping `data` only when it is the root.
    pub fn for_rank(rank: Rank, root: Rank, data: impl FnOnce() -> Vec<T>) -> Self {
        if rank == root {
            BcastSource::Source(data())
        } else {
            BcastSource::NotSource
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, BcastSource::Source(_))
    }
}

/// Sent once ahead of the data so receivers can size their buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub total_chunks: usize,
    pub max_chunk_len: usize,
    pub total_len: usize,
    pub datatype: Datatype,
}

impl ChunkHeader {
    /// Number of `u64` words in the encoded header.
    pub const WORDS: usize = 4;

    pub fn new(total_len: usize, max_chunk_len: usize, datatype: Datatype) -> Self {
        Self {
            total_chunks: total_len.div_ceil(max_chunk_len),
            max_chunk_len,
            total_len,
            datatype,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_elements(&[
            self.total_chunks as u64,
            self.max_chunk_len as u64,
            self.total_len as u64,
            self.datatype.code(),
        ])
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::WORDS * Datatype::U64.size() {
            return Err(ChunkcastError::TransportError {
                message: format!("chunk header has {} bytes", bytes.len()),
            });
        }
        let mut words: Vec<u64> = Vec::with_capacity(Self::WORDS);
        decode_elements(bytes, &mut words);

        let to_usize = |word: u64| {
            usize::try_from(word).map_err(|_| ChunkcastError::TransportError {
                message: format!("chunk header value {} does not fit in usize", word),
            })
        };
        let header = Self {
            total_chunks: to_usize(words[0])?,
            max_chunk_len: to_usize(words[1])?,
            total_len: to_usize(words[2])?,
            datatype: Datatype::from_code(words[3])?,
        };

        if header.max_chunk_len == 0 && header.total_len > 0 {
            return Err(ChunkcastError::TransportError {
                message: "chunk header carries a zero chunk length".to_string(),
            });
        }
        Ok(header)
    }
}

/// Limits imposed by the underlying transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportLimits {
    /// Element count a single transmission may not exceed.
    pub count_ceiling: usize,
}

impl TransportLimits {
    pub fn new(count_ceiling: usize) -> Result<Self> {
        if count_ceiling < ChunkHeader::WORDS {
            return Err(ChunkcastError::InvalidConfigValueError {
                field: "count_ceiling".to_string(),
                value: count_ceiling.to_string(),
                reason: format!(
                    "Ceiling must leave room for the {}-word chunk header",
                    ChunkHeader::WORDS
                ),
            });
        }
        Ok(Self { count_ceiling })
    }
}

impl Default for TransportLimits {
    fn default() -> Self {
        Self {
            count_ceiling: INT_MAX,
        }
    }
}

/// Placement of a rank relative to the hosts of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    pub global_rank: Rank,
    pub intra_rank: Rank,
    pub intra_size: usize,
    pub inter_rank: Rank,
    pub inter_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BcastReport {
    pub ranks: usize,
    pub root: Rank,
    pub data_size: usize,
    pub max_chunk_len: usize,
    pub total_chunks: usize,
    /// Largest receive buffer a rank holds besides the result itself.
    pub max_chunk_bytes: usize,
    /// Process peak resident memory, when monitoring is enabled.
    pub peak_memory_mb: Option<u64>,
    pub elapsed: Duration,
}
