// chainindex_node_rust/src/blockchain/tip_tracker.rs

use crate::blockchain::active_chain::ActiveChain;
use crate::blockchain::block_index::{BlockId, BlockIndex, BlockStatus};
use crate::blockchain::fork_locator::branch_length;
use crate::blockchain::index_store::BlockIndexStore;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TipStatus {
    /// Tip of the active chain.
    Active,
    /// The tip or one of its ancestors failed validation.
    Invalid,
    /// Some block body on the branch is missing.
    HeadersOnly,
    /// Fully validated but not on the active chain.
    ValidFork,
    /// Headers are valid but the blocks were never fully validated.
    ValidHeaders,
    Unknown,
}

impl TipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TipStatus::Active => "active",
            TipStatus::Invalid => "invalid",
            TipStatus::HeadersOnly => "headers-only",
            TipStatus::ValidFork => "valid-fork",
            TipStatus::ValidHeaders => "valid-headers",
            TipStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainTip {
    pub height: u32,
    #[serde(serialize_with = "serialize_hash")]
    pub hash: [u8; 32],
    /// Blocks between the tip and its fork point; absent when the tip shares
    /// no ancestor with the active chain.
    #[serde(rename = "branchlen", skip_serializing_if = "Option::is_none")]
    pub branch_len: Option<u32>,
    pub status: TipStatus,
    #[serde(skip)]
    pub id: BlockId,
}

fn serialize_hash<S: serde::Serializer>(hash: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(hash))
}

/// Every leaf of the forest plus the active tip, highest first. Equal heights
/// are ordered by insertion sequence so distinct blocks never tie.
pub fn collect_tips(store: &BlockIndexStore, chain: &ActiveChain) -> Vec<BlockId> {
    let mut candidates: HashSet<BlockId> = store.iter().map(|n| n.id).collect();
    for node in store.iter() {
        if let Some(prev) = node.prev {
            candidates.remove(&prev);
        }
    }

    // The active tip is always reported, even if something was built on it.
    if let Some(tip) = chain.tip() {
        candidates.insert(tip);
    }

    let mut tips: Vec<BlockId> = candidates.into_iter().collect();
    tips.sort_by_key(|id| (Reverse(store.get(*id).height), *id));
    tips
}

/// First matching rule wins; the order matters.
pub fn classify(chain: &ActiveChain, node: &BlockIndex) -> TipStatus {
    if chain.tip() == Some(node.id) {
        TipStatus::Active
    } else if node.status.has_failed() {
        TipStatus::Invalid
    } else if node.chain_tx == 0 {
        TipStatus::HeadersOnly
    } else if node.status.is_valid(BlockStatus::VALID_SCRIPTS) {
        TipStatus::ValidFork
    } else if node.status.is_valid(BlockStatus::VALID_TREE) {
        TipStatus::ValidHeaders
    } else {
        log::warn!(
            "Chain tip {} at height {} has inconsistent status {:?}",
            node.hash_hex(),
            node.height,
            node.status
        );
        TipStatus::Unknown
    }
}

/// Classified, sorted tip list as served to the query layer.
pub fn chain_tips(store: &BlockIndexStore, chain: &ActiveChain) -> Vec<ChainTip> {
    collect_tips(store, chain)
        .into_iter()
        .map(|id| {
            let node = store.get(id);
            ChainTip {
                height: node.height,
                hash: node.hash,
                branch_len: branch_length(store, chain, id),
                status: classify(chain, node),
                id,
            }
        })
        .collect()
}
