pub mod connector;
pub mod types;

pub use connector::WalletConnector;
pub use types::*;
