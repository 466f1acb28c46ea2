// chainindex_node_rust/src/blockchain/difficulty.rs

use crate::blockchain::active_chain::ActiveChain;
use crate::blockchain::block_index::BlockIndex;
use crate::blockchain::index_store::BlockIndexStore;

/// Source of the compact target required for the block after `prev`. The rule
/// itself is consensus logic and lives outside the index.
pub trait NextWorkRequired: Send + Sync {
    fn next_work_required(&self, store: &BlockIndexStore, prev: &BlockIndex) -> u32;
}

/// Assumes the next block keeps its parent's target.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarryPreviousBits;

impl NextWorkRequired for CarryPreviousBits {
    fn next_work_required(&self, _store: &BlockIndexStore, prev: &BlockIndex) -> u32 {
        prev.bits()
    }
}

/// Always requires the same target.
#[derive(Debug, Clone, Copy)]
pub struct FixedBits(pub u32);

impl NextWorkRequired for FixedBits {
    fn next_work_required(&self, _store: &BlockIndexStore, _prev: &BlockIndex) -> u32 {
        self.0
    }
}

/// Difficulty of compact target `bits` as a multiple of the minimum difficulty
/// `pow_limit_bits` (which therefore maps to exactly 1.0).
///
/// Works on the compact form directly: mantissa ratio first, then one factor
/// of 256 per byte of exponent difference.
pub fn difficulty(bits: u32, pow_limit_bits: u32) -> f64 {
    let mantissa = bits & 0x00ff_ffff;
    if mantissa == 0 {
        log::warn!("Compact target {:08x} has a zero mantissa; reporting difficulty 0", bits);
        return 0.0;
    }

    let mut shift = (bits >> 24) & 0xff;
    let limit_shift = (pow_limit_bits >> 24) & 0xff;
    let mut diff = f64::from(pow_limit_bits & 0x00ff_ffff) / f64::from(mantissa);

    while shift < limit_shift {
        diff *= 256.0;
        shift += 1;
    }
    while shift > limit_shift {
        diff /= 256.0;
        shift -= 1;
    }
    diff
}

/// Difficulty of the node's own target.
pub fn header_difficulty(node: &BlockIndex, pow_limit_bits: u32) -> f64 {
    difficulty(node.bits(), pow_limit_bits)
}

/// Difficulty the block after `node` must meet. With no node given the
/// active tip is used; with no tip either the answer is 1.0.
pub fn network_difficulty(
    store: &BlockIndexStore,
    chain: &ActiveChain,
    node: Option<&BlockIndex>,
    rule: &dyn NextWorkRequired,
    pow_limit_bits: u32,
) -> f64 {
    let node = match node {
        Some(n) => n,
        None => match chain.tip() {
            Some(tip) => store.get(tip),
            None => return 1.0,
        },
    };
    let bits = rule.next_work_required(store, node);
    difficulty(bits, pow_limit_bits)
}
