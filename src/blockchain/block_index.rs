// chainindex_node_rust/src/blockchain/block_index.rs

use crate::blockchain::header::BlockHeaderData;
use std::fmt;

/// Arena handle into the `BlockIndexStore`. Assigned in insertion order, so it
/// doubles as a stable tie-break key between blocks of equal height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Validation progress bits, laid out like Bitcoin's block index status field.
/// The low three bits hold a validity level, not independent flags.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockStatus(pub u32);

impl BlockStatus {
    pub const VALID_UNKNOWN: u32 = 0;
    /// Parsed, version ok, hash satisfies claimed PoW, timestamp not in future.
    pub const VALID_HEADER: u32 = 1;
    /// All parents found, difficulty matches, timestamp >= median previous.
    pub const VALID_TREE: u32 = 2;
    /// Transactions were checked (only possible with data).
    pub const VALID_TRANSACTIONS: u32 = 3;
    /// Outputs do not overspend inputs, no double spends, coinbase output ok.
    pub const VALID_CHAIN: u32 = 4;
    /// Scripts and signatures ok.
    pub const VALID_SCRIPTS: u32 = 5;
    pub const VALID_MASK: u32 = 0x07;

    pub const HAVE_DATA: u32 = 0x08;
    pub const HAVE_UNDO: u32 = 0x10;
    pub const HAVE_MASK: u32 = Self::HAVE_DATA | Self::HAVE_UNDO;

    /// Stage after the last reached validness failed.
    pub const FAILED_VALID: u32 = 0x20;
    /// Descends from a failed block.
    pub const FAILED_CHILD: u32 = 0x40;
    pub const FAILED_MASK: u32 = Self::FAILED_VALID | Self::FAILED_CHILD;

    pub fn new(bits: u32) -> Self {
        BlockStatus(bits)
    }

    pub fn validity(self) -> u32 {
        self.0 & Self::VALID_MASK
    }

    pub fn has_failed(self) -> bool {
        self.0 & Self::FAILED_MASK != 0
    }

    pub fn has_data(self) -> bool {
        self.0 & Self::HAVE_DATA != 0
    }

    /// True when validation reached `level` and nothing on the path failed.
    pub fn is_valid(self, level: u32) -> bool {
        debug_assert!(level & !Self::VALID_MASK == 0, "not a validity level");
        if self.has_failed() {
            return false;
        }
        self.validity() >= level
    }
}

impl fmt::Debug for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockStatus({:#04x})", self.0)
    }
}

/// Cumulative work as a 256-bit big-endian integer. Big-endian byte order makes
/// the derived lexicographic `Ord` agree with numeric order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChainWork(pub [u8; 32]);

impl ChainWork {
    pub const ZERO: ChainWork = ChainWork([0u8; 32]);

    pub fn from_u128(v: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&v.to_be_bytes());
        ChainWork(bytes)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        // Accept short forms such as "0x1f" by left-padding to 64 digits.
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 64 {
            return None;
        }
        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes).ok()?;
        Some(ChainWork(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ChainWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainWork({})", self.to_hex().trim_start_matches('0'))
    }
}

#[derive(Debug, Clone)]
pub struct BlockIndex {
    pub id: BlockId,
    pub hash: [u8; 32],       // Hash of this block header
    pub prev: Option<BlockId>, // None only for genesis
    pub height: u32,
    pub header: BlockHeaderData,
    pub chain_work: ChainWork,
    pub status: BlockStatus,
    /// Transactions in this block; 0 until the body has been seen.
    pub tx_count: u32,
    /// Transactions in this block and all ancestors; 0 unless every ancestor
    /// body is available, which is what "headers-only" keys off.
    pub chain_tx: u64,
}

impl BlockIndex {
    pub fn bits(&self) -> u32 {
        self.header.bits
    }

    pub fn is_genesis(&self) -> bool {
        self.prev.is_none() && self.height == 0
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}
