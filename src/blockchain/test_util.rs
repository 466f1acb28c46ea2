// chainindex_node_rust/src/blockchain/test_util.rs
//
// Small forest builder shared by the unit tests.

use crate::blockchain::active_chain::ActiveChain;
use crate::blockchain::block_index::{BlockId, BlockStatus, ChainWork};
use crate::blockchain::header::BlockHeaderData;
use crate::blockchain::index_store::{BlockIndexStore, NewBlockIndex};

pub const FULLY_VALID: u32 = BlockStatus::VALID_SCRIPTS | BlockStatus::HAVE_DATA;
pub const TEST_BITS: u32 = 0x1f07ffff;

pub fn header(prev: [u8; 32], salt: u32) -> BlockHeaderData {
    let mut nonce = [0u8; 32];
    nonce[..4].copy_from_slice(&salt.to_le_bytes());
    BlockHeaderData {
        version: 4,
        prev_block_hash: prev,
        merkle_root: [0x11; 32],
        final_sapling_root: [0u8; 32],
        timestamp: 1_600_000_000 + salt,
        bits: TEST_BITS,
        nonce,
        solution: Vec::new(),
    }
}

pub struct Forest {
    pub store: BlockIndexStore,
    pub chain: ActiveChain,
    salt: u32,
}

impl Forest {
    pub fn new() -> Self {
        Forest {
            store: BlockIndexStore::new(),
            chain: ActiveChain::new(),
            salt: 0,
        }
    }

    pub fn genesis(&mut self) -> BlockId {
        self.salt += 1;
        let mut new = NewBlockIndex::from_header(header([0u8; 32], self.salt));
        new.status = BlockStatus::new(FULLY_VALID);
        new.tx_count = 1;
        new.chain_tx = 1;
        new.chain_work = ChainWork::from_u128(1);
        self.store.insert(new).expect("genesis insert")
    }

    /// Fully validated child with body data.
    pub fn child(&mut self, parent: BlockId) -> BlockId {
        self.child_with(parent, FULLY_VALID, None)
    }

    /// Child with explicit status; `chain_tx` defaults to parent's + 1.
    pub fn child_with(&mut self, parent: BlockId, status: u32, chain_tx: Option<u64>) -> BlockId {
        self.salt += 1;
        let p = self.store.get(parent);
        let mut new = NewBlockIndex::from_header(header(p.hash, self.salt));
        new.status = BlockStatus::new(status);
        new.tx_count = 1;
        new.chain_tx = chain_tx.unwrap_or(p.chain_tx + 1);
        new.chain_work = ChainWork::from_u128(u128::from(p.height) + 2);
        self.store.insert(new).expect("child insert")
    }

    /// Appends `n` fully valid blocks on top of `from`, returning the last.
    pub fn extend(&mut self, from: BlockId, n: u32) -> BlockId {
        let mut tip = from;
        for _ in 0..n {
            tip = self.child(tip);
        }
        tip
    }

    pub fn activate(&mut self, tip: BlockId) {
        self.chain.set_tip(&self.store, Some(tip));
    }

    pub fn hash(&self, id: BlockId) -> [u8; 32] {
        self.store.get(id).hash
    }
}
