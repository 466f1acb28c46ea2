pub mod active_chain;
pub mod block_index;
pub mod chain_state;
pub mod difficulty;
pub mod fork_locator;
pub mod header;
pub mod index_store;
pub mod queries;
pub mod tip_tracker;

#[cfg(test)]
pub(crate) mod test_util;
