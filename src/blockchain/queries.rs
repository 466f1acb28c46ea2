// chainindex_node_rust/src/blockchain/queries.rs
//
// Read-side queries in the shape the RPC layer reports them. All of them run
// against one `ChainView`, i.e. under a single shared lock.

use crate::blockchain::block_index::{BlockId, BlockIndex};
use crate::blockchain::chain_state::ChainView;
use crate::blockchain::difficulty::{header_difficulty, network_difficulty};
use crate::blockchain::fork_locator::find_fork;
use crate::blockchain::tip_tracker::{chain_tips, ChainTip};
use crate::error::{ChainIndexError, Result};
use serde::Serialize;

const HASH_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct HeaderSummary {
    pub hash: String,
    pub confirmations: i64,
    pub height: u32,
    pub version: i32,
    pub merkleroot: String,
    pub time: u32,
    pub nonce: String,
    pub solution: String,
    pub bits: String,
    pub difficulty: f64,
    pub chainwork: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previousblockhash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nextblockhash: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MajorityDesc {
    pub status: bool,
    pub found: u32,
    pub required: u32,
    pub window: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SoftForkDesc {
    pub id: &'static str,
    pub version: i32,
    pub enforce: MajorityDesc,
    pub reject: MajorityDesc,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockchainInfo {
    pub chain: &'static str,
    pub blocks: i64,
    pub headers: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bestblockhash: Option<String>,
    pub difficulty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chainwork: Option<String>,
    pub pruned: bool,
    pub softforks: Vec<SoftForkDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruneheight: Option<u32>,
}

const SOFT_FORKS: [(&str, i32); 3] = [("bip34", 2), ("bip66", 3), ("bip65", 4)];

/// Parses a 64-digit hex block hash.
pub fn parse_hash(s: &str) -> Result<[u8; 32]> {
    let mut hash = [0u8; 32];
    if s.len() != HASH_HEX_LEN || hex::decode_to_slice(s, &mut hash).is_err() {
        return Err(ChainIndexError::InvalidBlockRef(format!("'{}' is not a block hash", s)));
    }
    Ok(hash)
}

impl<'a> ChainView<'a> {
    pub fn block_count(&self) -> i64 {
        self.chain().height_or_none_marker()
    }

    pub fn best_block_hash(&self) -> Option<[u8; 32]> {
        self.chain().tip().map(|id| self.store().get(id).hash)
    }

    /// Difficulty required of the next block on the active chain.
    pub fn difficulty(&self) -> f64 {
        network_difficulty(
            self.store(),
            self.chain(),
            None,
            self.next_work(),
            self.params().pow_limit_bits,
        )
    }

    /// Network difficulty after a specific block.
    pub fn network_difficulty_after(&self, hash: &[u8; 32]) -> Result<f64> {
        let node = self.store().lookup(hash)?;
        Ok(network_difficulty(
            self.store(),
            self.chain(),
            Some(node),
            self.next_work(),
            self.params().pow_limit_bits,
        ))
    }

    /// Depth below the tip counting the block itself, or -1 off the active chain.
    pub fn confirmations(&self, node: &BlockIndex) -> i64 {
        match self.chain().height() {
            Some(tip) if self.chain().contains(node) => i64::from(tip) - i64::from(node.height) + 1,
            _ => -1,
        }
    }

    pub fn block_hash(&self, height: i64) -> Result<[u8; 32]> {
        let id = self.chain().at(height)?;
        Ok(self.store().get(id).hash)
    }

    /// Accepts either an active-chain height (decimal, shorter than a hash)
    /// or a full block hash.
    pub fn resolve_block_ref(&self, reference: &str) -> Result<BlockId> {
        if reference.len() < HASH_HEX_LEN {
            if reference.is_empty() || !reference.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ChainIndexError::InvalidBlockRef(format!(
                    "invalid block height '{}'",
                    reference
                )));
            }
            let height: i64 = reference.parse().map_err(|_| {
                ChainIndexError::InvalidBlockRef(format!("invalid block height '{}'", reference))
            })?;
            return self.chain().at(height);
        }
        let hash = parse_hash(reference)?;
        Ok(self.store().lookup(&hash)?.id)
    }

    pub fn header_summary(&self, hash: &[u8; 32]) -> Result<HeaderSummary> {
        let node = self.store().lookup(hash)?;
        Ok(self.summarize(node))
    }

    /// Serialized header as hex, the non-verbose form of `header_summary`.
    pub fn serialized_header(&self, hash: &[u8; 32]) -> Result<String> {
        Ok(hex::encode(self.store().lookup(hash)?.header.encode()))
    }

    pub fn summarize(&self, node: &BlockIndex) -> HeaderSummary {
        let store = self.store();
        HeaderSummary {
            hash: node.hash_hex(),
            confirmations: self.confirmations(node),
            height: node.height,
            version: node.header.version,
            merkleroot: hex::encode(node.header.merkle_root),
            time: node.header.timestamp,
            nonce: hex::encode(node.header.nonce),
            solution: hex::encode(&node.header.solution),
            bits: format!("{:08x}", node.bits()),
            difficulty: header_difficulty(node, self.params().pow_limit_bits),
            chainwork: node.chain_work.to_hex(),
            previousblockhash: store.parent(node).map(BlockIndex::hash_hex),
            nextblockhash: self.chain().next(node).map(|id| store.get(id).hash_hex()),
        }
    }

    pub fn chain_tips(&self) -> Vec<ChainTip> {
        chain_tips(self.store(), self.chain())
    }

    /// Fork point of `hash` with the active chain.
    pub fn fork_point(&self, hash: &[u8; 32]) -> Result<Option<[u8; 32]>> {
        let node = self.store().lookup(hash)?;
        Ok(find_fork(self.store(), self.chain(), node.id).map(|id| self.store().get(id).hash))
    }

    /// Counts blocks of at least `min_version` among the last `majority_window`
    /// blocks ending at `tip`.
    pub fn soft_fork_majority(&self, min_version: i32, tip: Option<BlockId>, required: u32) -> MajorityDesc {
        let window = self.params().majority_window;
        let mut found = 0;
        let mut cursor = tip.map(|id| self.store().get(id));
        for _ in 0..window {
            let Some(node) = cursor else { break };
            if node.header.version >= min_version {
                found += 1;
            }
            cursor = self.store().parent(node);
        }
        MajorityDesc {
            status: found >= required,
            found,
            required,
            window,
        }
    }

    /// Lowest height whose block data is still held contiguously below the tip.
    pub fn prune_height(&self) -> Option<u32> {
        let mut block = self.store().get(self.chain().tip()?);
        while let Some(parent) = self.store().parent(block) {
            if !parent.status.has_data() {
                break;
            }
            block = parent;
        }
        Some(block.height)
    }

    pub fn blockchain_info(&self, prune_mode: bool) -> BlockchainInfo {
        let params = self.params();
        let tip = self.chain().tip().map(|id| self.store().get(id));
        let softforks = SOFT_FORKS
            .iter()
            .map(|&(id, version)| SoftForkDesc {
                id,
                version,
                enforce: self.soft_fork_majority(version, tip.map(|t| t.id), params.majority_enforce_block_upgrade),
                reject: self.soft_fork_majority(version, tip.map(|t| t.id), params.majority_reject_block_outdated),
            })
            .collect();

        BlockchainInfo {
            chain: params.network_id_string,
            blocks: self.block_count(),
            headers: self.store().best_header().map_or(-1, |n| i64::from(n.height)),
            bestblockhash: tip.map(BlockIndex::hash_hex),
            difficulty: self.difficulty(),
            chainwork: tip.map(|t| t.chain_work.to_hex()),
            pruned: prune_mode,
            softforks,
            pruneheight: if prune_mode { self.prune_height() } else { None },
        }
    }
}
