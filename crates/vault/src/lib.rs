pub mod crypto;
pub mod error;
pub mod ledger;
pub mod store;

pub use error::VaultError;
pub use ledger::{Ledger, LedgerError, LedgerStats, VaultEntry};
pub use store::{Vault, VaultStatus};
