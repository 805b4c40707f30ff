//! WavePortal contract interface.

use alloy_primitives::{Address, address};
use alloy_sol_types::sol;

sol! {
    /// One logged wave as stored by the contract.
    #[derive(Debug, PartialEq, Eq)]
    struct Wave {
        address waver;
        uint256 timestamp;
        string message;
    }

    function getAllWaves() external view returns (Wave[] memory);

    function wave(string _message) external;

    /// Emitted on each successful `wave`.
    #[derive(Debug, PartialEq, Eq)]
    event NewWave(address indexed from, uint256 timestamp, string message);
}

/// Address the contract is deployed at.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("a8fBD49Ec9664461c0dBD5874FA70e6a11dF0fe7");

/// Gas allowance for one `wave` call.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
