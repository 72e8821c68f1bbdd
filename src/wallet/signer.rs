//! Signer capability seam.
//!
//! Each wallet integration (browser extension, WalletConnect bridge, ...)
//! supplies these traits; the driver stays agnostic of how signing actually
//! happens, including of how a given wallet signals user cancellation.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::intent::TransactionIntent;

/// A transaction frozen against a signer, ready for submission.
#[derive(Clone, Debug)]
pub struct FrozenTransaction {
    pub intent: TransactionIntent,
}

#[derive(Clone, Debug)]
pub struct SubmitResponse {
    /// Transaction id as reported by the ledger, in whatever form the wallet
    /// returns it; the driver normalizes it.
    pub transaction_id: String,
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn freeze(&self, intent: &TransactionIntent) -> Result<FrozenTransaction>;

    /// Submits a frozen transaction. `Ok(None)` means the wallet returned no
    /// response; some integrations signal a user rejection this way instead
    /// of raising an error.
    async fn submit(&self, transaction: FrozenTransaction) -> Result<Option<SubmitResponse>>;

    /// Classifies a raised reason as user-initiated cancellation. Each wallet
    /// encodes cancellation differently.
    fn is_cancel(&self, reason: &anyhow::Error) -> bool {
        let _ = reason;
        false
    }
}

pub trait SignerProvider: Send + Sync {
    /// The signer for `account_id`, if that account is connected. Absence is
    /// an internal inconsistency, not a user error.
    fn signer_for(&self, account_id: &str) -> Option<Arc<dyn TransactionSigner>>;
}
