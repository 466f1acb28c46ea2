// chainindex_node_rust/src/lib.rs

pub mod api_service;
pub mod blockchain;
pub mod chainparams;
pub mod config;
pub mod error;
pub mod snapshot;
