// chainindex_node_rust/src/blockchain/chain_state.rs

use crate::blockchain::active_chain::ActiveChain;
use crate::blockchain::block_index::BlockId;
use crate::blockchain::difficulty::NextWorkRequired;
use crate::blockchain::index_store::{BlockIndexStore, NewBlockIndex};
use crate::chainparams::ChainParams;
use crate::error::Result;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The forest and the chain selected through it. Always mutated together.
#[derive(Debug, Default)]
pub struct ChainIndex {
    pub store: BlockIndexStore,
    pub chain: ActiveChain,
}

pub struct ChainState {
    // All known block indexes plus the active chain, behind one lock so a
    // reader never sees a chain that refers to a half-updated store.
    inner: RwLock<ChainIndex>,
    params: ChainParams,
    next_work: Box<dyn NextWorkRequired>,
}

// Manual Debug implementation for ChainState
impl std::fmt::Debug for ChainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ChainState")
            .field("block_index_len", &inner.store.len())
            .field("active_height", &inner.chain.height_or_none_marker())
            .field("network", &self.params.network_id_string)
            .field("next_work", &"Box<dyn NextWorkRequired>")
            .finish()
    }
}

impl ChainState {
    pub fn new(params: ChainParams, next_work: Box<dyn NextWorkRequired>) -> Self {
        ChainState {
            inner: RwLock::new(ChainIndex::default()),
            params,
            next_work,
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// Indexes a validated header. Does not move the active chain.
    pub fn add_block_index(&self, new: NewBlockIndex) -> Result<BlockId> {
        let hash = new.hash;
        let result = self.write().store.insert(new);
        if let Err(ref e) = result {
            if e.is_integrity_violation() {
                log::error!("Rejected header {}: {}", hex::encode(hash), e);
            }
        }
        result
    }

    /// Makes `hash` the active tip.
    pub fn set_best_tip(&self, hash: &[u8; 32]) -> Result<()> {
        let mut guard = self.write();
        let index = &mut *guard;
        let id = index.store.lookup(hash)?.id;
        index.chain.set_tip(&index.store, Some(id));
        log::info!("New chain tip: height={}, hash={}", index.store.get(id).height, hex::encode(hash));
        Ok(())
    }

    /// Activates the most-work valid header, if any.
    pub fn activate_best_header(&self) -> Option<[u8; 32]> {
        let mut guard = self.write();
        let index = &mut *guard;
        let best = index.store.best_header().map(|n| (n.id, n.hash, n.height))?;
        index.chain.set_tip(&index.store, Some(best.0));
        log::info!("New chain tip: height={}, hash={}", best.2, hex::encode(best.1));
        Some(best.1)
    }

    /// Tip height and hash.
    pub fn get_tip(&self) -> Option<(u32, [u8; 32])> {
        let inner = self.read_index();
        inner.chain.tip().map(|id| {
            let node = inner.store.get(id);
            (node.height, node.hash)
        })
    }

    /// Runs `f` with exclusive access, for the validator's status updates.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut ChainIndex) -> R) -> R {
        f(&mut self.write())
    }

    /// Read snapshot; the shared lock is held until the view is dropped.
    pub fn view(&self) -> ChainView<'_> {
        ChainView {
            guard: self.read_index(),
            params: &self.params,
            next_work: self.next_work.as_ref(),
        }
    }

    // A writer that panicked left either the old or the new state in place;
    // both are consistent, so poisoning is ignored.
    fn read_index(&self) -> RwLockReadGuard<'_, ChainIndex> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ChainIndex> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Consistent read-only view of store and active chain.
pub struct ChainView<'a> {
    guard: RwLockReadGuard<'a, ChainIndex>,
    params: &'a ChainParams,
    next_work: &'a dyn NextWorkRequired,
}

impl<'a> ChainView<'a> {
    pub fn store(&self) -> &BlockIndexStore {
        &self.guard.store
    }

    pub fn chain(&self) -> &ActiveChain {
        &self.guard.chain
    }

    pub fn params(&self) -> &ChainParams {
        self.params
    }

    pub fn next_work(&self) -> &dyn NextWorkRequired {
        self.next_work
    }
}
