// chainindex_node_rust/src/chainparams.rs

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    pub network_id_string: &'static str,
    /// Minimum-difficulty target in compact form; difficulty 1.0.
    pub pow_limit_bits: u32,
    /// Blocks counted back from the tip when measuring soft-fork adoption.
    pub majority_window: u32,
    pub majority_enforce_block_upgrade: u32,
    pub majority_reject_block_outdated: u32,
}

pub const MAINNET_PARAMS: ChainParams = ChainParams {
    network_id_string: "main",
    pow_limit_bits: 0x1f07ffff,
    majority_window: 4000,
    majority_enforce_block_upgrade: 750,
    majority_reject_block_outdated: 950,
};

pub const TESTNET_PARAMS: ChainParams = ChainParams {
    network_id_string: "test",
    pow_limit_bits: 0x2007ffff,
    majority_window: 100,
    majority_enforce_block_upgrade: 51,
    majority_reject_block_outdated: 75,
};

pub const REGTEST_PARAMS: ChainParams = ChainParams {
    network_id_string: "regtest",
    pow_limit_bits: 0x200f0f0f,
    majority_window: 1000,
    majority_enforce_block_upgrade: 750,
    majority_reject_block_outdated: 950,
};

pub fn params_for(network: &str) -> Option<&'static ChainParams> {
    match network {
        "main" | "mainnet" => Some(&MAINNET_PARAMS),
        "test" | "testnet" => Some(&TESTNET_PARAMS),
        "regtest" => Some(&REGTEST_PARAMS),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(params_for("main"), Some(&MAINNET_PARAMS));
        assert_eq!(params_for("testnet").map(|p| p.network_id_string), Some("test"));
        assert_eq!(params_for("regtest").map(|p| p.majority_window), Some(1000));
        assert!(params_for("signet").is_none());
    }
}
