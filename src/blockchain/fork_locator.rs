// chainindex_node_rust/src/blockchain/fork_locator.rs

use crate::blockchain::active_chain::ActiveChain;
use crate::blockchain::block_index::BlockId;
use crate::blockchain::index_store::BlockIndexStore;

/// Highest ancestor of `id` (possibly `id` itself) that lies on the active
/// chain. `None` only when `id` belongs to a tree the active chain is not part
/// of, or the active chain is empty.
///
/// Cost is proportional to how far `id` sits from the active chain.
pub fn find_fork(store: &BlockIndexStore, chain: &ActiveChain, id: BlockId) -> Option<BlockId> {
    let tip_height = chain.height()?;
    let mut node = store.get(id);

    // Anything above the tip cannot be on the chain; drop straight to tip height.
    if node.height > tip_height {
        node = store.get(store.ancestor(id, tip_height)?);
    }

    loop {
        if chain.contains(node) {
            return Some(node.id);
        }
        node = store.parent(node)?;
    }
}

/// Distance from `id` down to its fork point with the active chain.
pub fn branch_length(store: &BlockIndexStore, chain: &ActiveChain, id: BlockId) -> Option<u32> {
    let fork = find_fork(store, chain, id)?;
    Some(store.get(id).height - store.get(fork).height)
}
