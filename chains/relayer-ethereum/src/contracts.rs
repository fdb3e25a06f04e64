#![allow(missing_docs)]

use ethers::prelude::abigen;

abigen!(
    WalletContract,
    r#"[
        function keyExist(address key) external view returns (bool)
        function requiredSignatures() external view returns (uint256)
        function lastNonce() external view returns (uint256)
        function addKey(address key) external returns (bool)
        function addKeys(address[] keys) external returns (bool)
        function removeKey(address key) external returns (bool)
        function setRequiredSignatures(uint256 requiredSignatures) external
        function executeSigned(address to, uint256 value, bytes data, uint256 nonce, uint256 gasPrice, address gasToken, uint256 gasLimitExecution, uint256 gasData, bytes signatures) external returns (bytes32)
    ]"#
);

abigen!(
    Erc20,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
    ]"#
);

abigen!(
    WalletFactory,
    r#"[
        function createContract(address publicKey, string ensName, uint256 gasPrice, address gasToken, bytes signature) external returns (bool)
    ]"#
);
