// chainindex_node_rust/src/blockchain/active_chain.rs

use crate::blockchain::block_index::{BlockId, BlockIndex};
use crate::blockchain::index_store::BlockIndexStore;
use crate::error::{ChainIndexError, Result};

/// The selected best chain as a dense sequence indexed by height.
///
/// Invariant: `chain[h]` is the parent of `chain[h + 1]`, and
/// `chain.len() == tip.height + 1`.
#[derive(Debug, Clone, Default)]
pub struct ActiveChain {
    chain: Vec<BlockId>,
}

impl ActiveChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Tip height, or `None` before genesis is activated.
    pub fn height(&self) -> Option<u32> {
        self.chain.len().checked_sub(1).map(|h| h as u32)
    }

    /// Tip height with `-1` standing in for the empty chain, as reported by
    /// the query layer.
    pub fn height_or_none_marker(&self) -> i64 {
        self.chain.len() as i64 - 1
    }

    pub fn tip(&self) -> Option<BlockId> {
        self.chain.last().copied()
    }

    pub fn genesis(&self) -> Option<BlockId> {
        self.chain.first().copied()
    }

    /// Identity check at the node's own height; a side-branch block sharing a
    /// height with an active block is not contained.
    pub fn contains(&self, node: &BlockIndex) -> bool {
        self.chain.get(node.height as usize) == Some(&node.id)
    }

    pub fn get(&self, height: u32) -> Option<BlockId> {
        self.chain.get(height as usize).copied()
    }

    pub fn at(&self, height: i64) -> Result<BlockId> {
        if height < 0 {
            return Err(self.out_of_range(height));
        }
        usize::try_from(height)
            .ok()
            .and_then(|h| self.chain.get(h).copied())
            .ok_or_else(|| self.out_of_range(height))
    }

    /// Successor of `node` on this chain, if `node` is on it and not the tip.
    pub fn next(&self, node: &BlockIndex) -> Option<BlockId> {
        if !self.contains(node) {
            return None;
        }
        self.get(node.height + 1)
    }

    pub fn clear(&mut self) {
        self.chain.clear();
    }

    /// Moves the tip to `tip`, keeping the shared prefix and rewriting only the
    /// diverging suffix. `None` clears the chain.
    pub fn set_tip(&mut self, store: &BlockIndexStore, tip: Option<BlockId>) {
        let Some(tip_id) = tip else {
            self.clear();
            return;
        };

        let height = store.get(tip_id).height as usize;
        self.chain.truncate(height + 1);

        let mut segment = Vec::new();
        let mut cursor = Some(tip_id);
        while let Some(id) = cursor {
            let node = store.get(id);
            if self.chain.get(node.height as usize) == Some(&id) {
                break;
            }
            segment.push(id);
            cursor = node.prev;
        }

        let shared = height + 1 - segment.len();
        let replaced = self.chain.len().saturating_sub(shared);
        self.chain.truncate(shared);
        self.chain.extend(segment.into_iter().rev());

        if replaced > 0 {
            log::debug!(
                "Active chain reorganized: {} block(s) replaced, new tip height={}",
                replaced,
                height
            );
        }
        log::debug!("Active chain tip: height={}, hash={}", height, store.get(tip_id).hash_hex());
    }

    /// Block locator for the tip: the last 10 hashes densely, then exponentially
    /// sparser back to genesis, which is always the final entry.
    pub fn locator(&self, store: &BlockIndexStore) -> Vec<[u8; 32]> {
        let mut locator = Vec::new();
        let Some(mut height) = self.height() else {
            return locator;
        };
        let mut step = 1u32;
        loop {
            locator.push(store.get(self.chain[height as usize]).hash);
            if height == 0 {
                break;
            }
            height = height.saturating_sub(step);
            if locator.len() > 10 {
                step = step.saturating_mul(2);
            }
        }
        locator
    }

    fn out_of_range(&self, height: i64) -> ChainIndexError {
        ChainIndexError::OutOfRange {
            height,
            tip: self.height_or_none_marker(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::test_util::Forest;

    #[test]
    fn empty_chain() {
        let chain = ActiveChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.height(), None);
        assert_eq!(chain.height_or_none_marker(), -1);
        assert_eq!(chain.tip(), None);
        assert!(matches!(chain.at(0), Err(ChainIndexError::OutOfRange { tip: -1, .. })));
    }

    #[test]
    fn at_height_equals_tip() {
        let mut f = Forest::new();
        let g = f.genesis();
        let tip = f.extend(g, 3);
        f.activate(tip);

        let h = f.chain.height().unwrap();
        assert_eq!(h, 3);
        assert_eq!(f.chain.at(i64::from(h)).unwrap(), tip);
        assert_eq!(f.chain.tip(), Some(tip));
        assert_eq!(f.chain.genesis(), Some(g));
    }

    #[test]
    fn at_rejects_out_of_range() {
        let mut f = Forest::new();
        let g = f.genesis();
        let tip = f.extend(g, 3);
        f.activate(tip);

        match f.chain.at(5) {
            Err(ChainIndexError::OutOfRange { height, tip }) => {
                assert_eq!(height, 5);
                assert_eq!(tip, 3);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
        assert!(f.chain.at(-1).is_err());
    }

    #[test]
    fn contains_checks_identity_not_height() {
        let mut f = Forest::new();
        let g = f.genesis();
        let a = f.child(g);
        let b = f.child(a);
        let side = f.child(a);
        f.activate(b);

        assert!(f.chain.contains(f.store.get(b)));
        assert!(!f.chain.contains(f.store.get(side)));
        assert_eq!(f.store.get(side).height, f.store.get(b).height);

        for node in f.store.iter() {
            let expected = f.chain.get(node.height) == Some(node.id);
            assert_eq!(f.chain.contains(node), expected);
        }
    }

    #[test]
    fn next_follows_active_chain_only() {
        let mut f = Forest::new();
        let g = f.genesis();
        let a = f.child(g);
        let b = f.child(a);
        let side = f.child(a);
        f.activate(b);

        assert_eq!(f.chain.next(f.store.get(g)), Some(a));
        assert_eq!(f.chain.next(f.store.get(a)), Some(b));
        assert_eq!(f.chain.next(f.store.get(b)), None);
        assert_eq!(f.chain.next(f.store.get(side)), None);
    }

    #[test]
    fn set_tip_reorganizes_suffix() {
        let mut f = Forest::new();
        let g = f.genesis();
        let a = f.child(g);
        let b = f.extend(a, 3);
        let c = f.extend(a, 1);
        f.activate(b);
        assert_eq!(f.chain.height(), Some(4));

        // Reorg to a shorter branch: the old suffix is dropped.
        f.activate(c);
        assert_eq!(f.chain.height(), Some(2));
        assert_eq!(f.chain.tip(), Some(c));
        assert_eq!(f.chain.get(1), Some(a));

        // Extending the tip appends only the new block.
        let d = f.child(c);
        f.activate(d);
        assert_eq!(f.chain.height(), Some(3));
        for h in 1..=3u32 {
            let id = f.chain.get(h).unwrap();
            let parent = f.store.get(id).prev;
            assert_eq!(parent, f.chain.get(h - 1));
        }

        // Rolling back to an ancestor truncates.
        f.activate(a);
        assert_eq!(f.chain.tip(), Some(a));
        f.chain.set_tip(&f.store, None);
        assert!(f.chain.is_empty());
    }

    #[test]
    fn locator_is_dense_then_sparse_and_ends_at_genesis() {
        let mut f = Forest::new();
        let g = f.genesis();
        let tip = f.extend(g, 40);
        f.activate(tip);

        let locator = f.chain.locator(&f.store);
        assert_eq!(locator[0], f.hash(tip));
        assert_eq!(*locator.last().unwrap(), f.hash(g));
        // Dense down to 29, then steps of 2, 4, 8, then clamped to genesis.
        let heights: Vec<u32> = locator
            .iter()
            .map(|h| f.store.lookup(h).unwrap().height)
            .collect();
        assert_eq!(&heights[..11], &[40, 39, 38, 37, 36, 35, 34, 33, 32, 31, 30]);
        assert_eq!(&heights[11..], &[29, 27, 23, 15, 0]);
    }
}
