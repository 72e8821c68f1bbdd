use thiserror::Error;

/// Wallet-operation failures the UI needs to tell apart.
///
/// `Cancelled` is user-initiated and gets no error banner; everything else
/// does.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user declined or dismissed the signing prompt.
    #[error("Transaction was cancelled in the wallet")]
    Cancelled,

    /// Rejected before any signer or network call.
    #[error("{0}")]
    InvalidInput(String),

    /// Any other signer or submission failure, original message preserved.
    #[error("Wallet call failed: {0}")]
    CallFailure(String),
}

impl WalletError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WalletError::Cancelled)
    }
}
