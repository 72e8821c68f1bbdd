//! Wallet transaction driver and its seams.
//!
//! The driver builds ledger transactions from validated inputs, signs and
//! submits them through an externally supplied signer, and then watches the
//! transaction cache until the submission surfaces on the mirror node.

pub mod driver;
pub mod error;
pub mod intent;
pub mod signer;

pub use driver::WalletDriver;
pub use error::WalletError;
pub use intent::{NftAllowanceScope, TransactionIntent};
pub use signer::{FrozenTransaction, SignerProvider, SubmitResponse, TransactionSigner};
