// chainindex_node_rust/src/snapshot.rs
//
// JSON header feed: the validator's accepted headers, parents first.

use crate::blockchain::block_index::{BlockStatus, ChainWork};
use crate::blockchain::chain_state::ChainState;
use crate::blockchain::header::BlockHeaderData;
use crate::blockchain::index_store::NewBlockIndex;
use crate::blockchain::queries::parse_hash;
use crate::error::{ChainIndexError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct HeaderRecord {
    /// Index key as reported by the validator. Derived from the header
    /// fields only when absent.
    #[serde(default)]
    pub hash: Option<String>,
    pub version: i32,
    pub prev_block_hash: String,
    pub merkle_root: String,
    #[serde(default)]
    pub final_sapling_root: Option<String>,
    pub time: u32,
    /// Compact target as 8 hex digits, e.g. "1f07ffff".
    pub bits: String,
    pub nonce: String,
    #[serde(default)]
    pub solution: String,
    pub status: u32,
    #[serde(default)]
    pub tx_count: u32,
    #[serde(default)]
    pub chain_tx: u64,
    /// Defaults to the parent's chain work when absent.
    #[serde(default)]
    pub chain_work: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub headers: Vec<HeaderRecord>,
    /// Active tip; the most-work valid header when omitted.
    #[serde(default)]
    pub best_tip: Option<String>,
}

fn snapshot_err(msg: String) -> ChainIndexError {
    ChainIndexError::Snapshot(msg)
}

fn decode_32(field: &str, value: &str) -> Result<[u8; 32]> {
    let mut out = [0u8; 32];
    hex::decode_to_slice(value, &mut out)
        .map_err(|e| snapshot_err(format!("{} '{}': {}", field, value, e)))?;
    Ok(out)
}

impl HeaderRecord {
    pub fn to_new_block_index(&self) -> Result<NewBlockIndex> {
        let bits = u32::from_str_radix(&self.bits, 16)
            .map_err(|e| snapshot_err(format!("bits '{}': {}", self.bits, e)))?;
        let solution = hex::decode(&self.solution)
            .map_err(|e| snapshot_err(format!("solution: {}", e)))?;
        let header = BlockHeaderData {
            version: self.version,
            prev_block_hash: decode_32("prev_block_hash", &self.prev_block_hash)?,
            merkle_root: decode_32("merkle_root", &self.merkle_root)?,
            final_sapling_root: match &self.final_sapling_root {
                Some(root) => decode_32("final_sapling_root", root)?,
                None => [0u8; 32],
            },
            timestamp: self.time,
            bits,
            nonce: decode_32("nonce", &self.nonce)?,
            solution,
        };

        let mut new = NewBlockIndex::from_header(header);
        if let Some(hash) = &self.hash {
            new.hash = decode_32("hash", hash)?;
        }
        new.status = BlockStatus::new(self.status);
        new.tx_count = self.tx_count;
        new.chain_tx = self.chain_tx;
        if let Some(work) = &self.chain_work {
            new.chain_work = ChainWork::from_hex(work)
                .ok_or_else(|| snapshot_err(format!("chain_work '{}'", work)))?;
        }
        Ok(new)
    }
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let data = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&data)?;
    log::info!("Read {} header records from {}", snapshot.headers.len(), path.display());
    Ok(snapshot)
}

/// Inserts every record in order, then selects the active tip. Stops at the
/// first integrity error.
pub fn apply_snapshot(state: &ChainState, snapshot: &Snapshot) -> Result<usize> {
    for record in &snapshot.headers {
        let mut new = record.to_new_block_index()?;
        if record.chain_work.is_none() && !new.header.is_genesis() {
            let view = state.view();
            if let Some(parent) = view.store().get_id(&new.header.prev_block_hash) {
                new.chain_work = view.store().get(parent).chain_work;
            }
        }
        state.add_block_index(new)?;
    }

    match &snapshot.best_tip {
        Some(tip) => state.set_best_tip(&parse_hash(tip)?)?,
        None => {
            if state.activate_best_header().is_none() {
                log::warn!("Snapshot contained no valid header to activate");
            }
        }
    }
    Ok(snapshot.headers.len())
}
