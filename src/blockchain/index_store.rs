// chainindex_node_rust/src/blockchain/index_store.rs

use crate::blockchain::block_index::{BlockId, BlockIndex, BlockStatus, ChainWork};
use crate::blockchain::header::BlockHeaderData;
use crate::error::{ChainIndexError, Result};
use std::collections::HashMap;

/// A header accepted by the validator, ready to be indexed.
#[derive(Debug, Clone)]
pub struct NewBlockIndex {
    pub hash: [u8; 32],
    pub header: BlockHeaderData,
    pub status: BlockStatus,
    pub tx_count: u32,
    pub chain_tx: u64,
    pub chain_work: ChainWork,
}

impl NewBlockIndex {
    /// Header-only entry keyed by the header's own hash.
    pub fn from_header(header: BlockHeaderData) -> Self {
        NewBlockIndex {
            hash: header.get_hash(),
            header,
            status: BlockStatus::new(BlockStatus::VALID_TREE),
            tx_count: 0,
            chain_tx: 0,
            chain_work: ChainWork::ZERO,
        }
    }
}

/// Owns every indexed header. Nodes live in an arena and refer to their parent
/// by `BlockId`, so the store is the only owner and entries are never removed.
#[derive(Debug, Default)]
pub struct BlockIndexStore {
    nodes: Vec<BlockIndex>,
    by_hash: HashMap<[u8; 32], BlockId>,
    // Most-work header that is not known to be invalid.
    best_header: Option<BlockId>,
}

impl BlockIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, new: NewBlockIndex) -> Result<BlockId> {
        if self.by_hash.contains_key(&new.hash) {
            return Err(ChainIndexError::DuplicateHash { hash: new.hash });
        }

        let (prev, height) = if new.header.is_genesis() {
            (None, 0)
        } else {
            let parent_id = self.by_hash.get(&new.header.prev_block_hash).copied().ok_or(
                ChainIndexError::UnknownParent {
                    hash: new.hash,
                    prev_hash: new.header.prev_block_hash,
                },
            )?;
            let parent = self.get(parent_id);
            if new.chain_work < parent.chain_work {
                return Err(ChainIndexError::ChainWorkRegression { hash: new.hash });
            }
            (Some(parent_id), parent.height + 1)
        };

        let id = next_id(self.nodes.len())?;
        self.nodes.push(BlockIndex {
            id,
            hash: new.hash,
            prev,
            height,
            header: new.header,
            chain_work: new.chain_work,
            status: new.status,
            tx_count: new.tx_count,
            chain_tx: new.chain_tx,
        });
        self.by_hash.insert(new.hash, id);
        log::debug!("Indexed block: height={}, hash={}", height, hex::encode(new.hash));

        if self.is_better_header(id) {
            self.best_header = Some(id);
        }
        Ok(id)
    }

    pub fn lookup(&self, hash: &[u8; 32]) -> Result<&BlockIndex> {
        self.by_hash
            .get(hash)
            .map(|id| self.get(*id))
            .ok_or(ChainIndexError::NotFound { hash: *hash })
    }

    pub fn get_id(&self, hash: &[u8; 32]) -> Option<BlockId> {
        self.by_hash.get(hash).copied()
    }

    pub fn contains(&self, hash: &[u8; 32]) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Ids are only ever handed out by this store, so indexing cannot miss.
    pub fn get(&self, id: BlockId) -> &BlockIndex {
        &self.nodes[id.index()]
    }

    pub fn parent(&self, node: &BlockIndex) -> Option<&BlockIndex> {
        node.prev.map(|p| self.get(p))
    }

    /// Ancestor of `id` at `height`, walking parent links. `None` if `height`
    /// is above the node.
    pub fn ancestor(&self, id: BlockId, height: u32) -> Option<BlockId> {
        let mut current = self.get(id);
        if height > current.height {
            return None;
        }
        while current.height > height {
            current = self.parent(current)?;
        }
        Some(current.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockIndex> {
        self.nodes.iter()
    }

    pub fn best_header(&self) -> Option<&BlockIndex> {
        self.best_header.map(|id| self.get(id))
    }

    // --- Mutators used by the external validator ---

    pub fn update_status(&mut self, hash: &[u8; 32], status: BlockStatus) -> Result<()> {
        let id = self.require(hash)?;
        let node = &mut self.nodes[id.index()];
        let failure_changed = node.status.has_failed() != status.has_failed();
        node.status = status;
        if failure_changed {
            self.recompute_best_header();
        }
        Ok(())
    }

    pub fn set_chain_tx(&mut self, hash: &[u8; 32], chain_tx: u64) -> Result<()> {
        let id = self.require(hash)?;
        self.nodes[id.index()].chain_tx = chain_tx;
        Ok(())
    }

    /// Replaces a node's cumulative work. Rejected if it would put the node
    /// below its parent or above any of its children.
    pub fn set_chain_work(&mut self, hash: &[u8; 32], work: ChainWork) -> Result<()> {
        let id = self.require(hash)?;
        let node = self.get(id);
        if let Some(parent) = self.parent(node) {
            if work < parent.chain_work {
                return Err(ChainIndexError::ChainWorkRegression { hash: *hash });
            }
        }
        if self.nodes.iter().any(|n| n.prev == Some(id) && n.chain_work < work) {
            return Err(ChainIndexError::ChainWorkRegression { hash: *hash });
        }
        self.nodes[id.index()].chain_work = work;
        self.recompute_best_header();
        Ok(())
    }

    fn require(&self, hash: &[u8; 32]) -> Result<BlockId> {
        self.get_id(hash).ok_or(ChainIndexError::NotFound { hash: *hash })
    }

    fn is_better_header(&self, id: BlockId) -> bool {
        let candidate = self.get(id);
        if candidate.status.has_failed() {
            return false;
        }
        match self.best_header {
            Some(best) => candidate.chain_work > self.get(best).chain_work,
            None => true,
        }
    }

    fn recompute_best_header(&mut self) {
        // First-seen wins ties, same as incremental insertion.
        self.best_header = None;
        for idx in 0..self.nodes.len() {
            let id = BlockId(idx as u32);
            if self.is_better_header(id) {
                self.best_header = Some(id);
            }
        }
    }
}

fn next_id(len: usize) -> Result<BlockId> {
    u32::try_from(len)
        .map(BlockId)
        .map_err(|_| ChainIndexError::IndexFull { len })
}
