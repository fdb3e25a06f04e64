use ethers_core::{
    types::{H160, H256, U256},
    utils::keccak256,
};

/// Builder for Solidity's `abi.encodePacked`, restricted to the static
/// types wallet messages are made of.
#[derive(Debug, Default)]
pub struct PackedEncoder(Vec<u8>);

impl PackedEncoder {
    /// 20 raw bytes
    pub fn address(mut self, address: H160) -> Self {
        self.0.extend_from_slice(address.as_bytes());
        self
    }

    /// 32 big-endian bytes
    pub fn uint(mut self, value: U256) -> Self {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.0.extend_from_slice(&buf);
        self
    }

    /// Dynamic bytes and strings are packed without a length prefix
    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.0.extend_from_slice(value);
        self
    }

    /// Raw packed bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// keccak256 of the packed bytes
    pub fn keccak(self) -> H256 {
        H256::from(keccak256(self.0))
    }
}
