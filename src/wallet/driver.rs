//! The wallet transaction driver.
//!
//! Every public operation follows the same pipeline: build an intent from
//! validated inputs, obtain the signer for the paying account, freeze and
//! submit, normalize the returned transaction id. Token association and
//! dissociation additionally wait for the transaction to surface on the
//! mirror node, which is eventually consistent: acceptance by the network is
//! success, slow indexing only degrades the wait to returning the bare id.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::EntityCache;
use crate::config::Config;
use crate::txid;
use crate::types::Transaction;

use super::error::WalletError;
use super::intent::TransactionIntent;
use super::signer::{SignerProvider, TransactionSigner};

pub struct WalletDriver {
    signers: Arc<dyn SignerProvider>,
    transactions: Arc<EntityCache<String, Transaction>>,
    surfacing_attempts: u32,
    surfacing_interval: Duration,
}

impl WalletDriver {
    pub fn new(
        cfg: &Config,
        signers: Arc<dyn SignerProvider>,
        transactions: Arc<EntityCache<String, Transaction>>,
    ) -> Self {
        Self {
            signers,
            transactions,
            surfacing_attempts: cfg.surfacing_attempts,
            surfacing_interval: Duration::from_millis(cfg.surfacing_interval_ms),
        }
    }

    /// Changes the staking target of `account_id`. With neither a node id nor
    /// an account id the transaction explicitly unstakes.
    pub async fn change_staking(
        &self,
        account_id: &str,
        staked_node_id: Option<i64>,
        staked_account_id: Option<String>,
        decline_reward: Option<bool>,
    ) -> Result<String, WalletError> {
        let intent = TransactionIntent::staking_change(
            account_id,
            staked_node_id,
            staked_account_id,
            decline_reward,
        );
        self.execute_transaction(account_id, intent).await
    }

    pub async fn approve_hbar_allowance(
        &self,
        account_id: &str,
        spender: &str,
        amount: i64,
    ) -> Result<String, WalletError> {
        let intent = TransactionIntent::ApproveHbarAllowance {
            owner: account_id.to_string(),
            spender: spender.to_string(),
            amount,
        };
        self.execute_transaction(account_id, intent).await
    }

    pub async fn approve_token_allowance(
        &self,
        account_id: &str,
        token_id: &str,
        spender: &str,
        amount: i64,
    ) -> Result<String, WalletError> {
        let intent = TransactionIntent::ApproveTokenAllowance {
            owner: account_id.to_string(),
            token_id: token_id.to_string(),
            spender: spender.to_string(),
            amount,
        };
        self.execute_transaction(account_id, intent).await
    }

    /// Approves an NFT allowance. An empty serial list approves all serials;
    /// 1 to 20 serials are approved individually; more is rejected before any
    /// signer call.
    pub async fn approve_nft_allowance(
        &self,
        account_id: &str,
        token_id: &str,
        spender: &str,
        serials: Vec<i64>,
    ) -> Result<String, WalletError> {
        let intent = TransactionIntent::nft_allowance(account_id, token_id, spender, serials)?;
        self.execute_transaction(account_id, intent).await
    }

    pub async fn associate_token(
        &self,
        account_id: &str,
        token_id: &str,
    ) -> Result<String, WalletError> {
        let intent = TransactionIntent::TokenAssociate {
            account_id: account_id.to_string(),
            token_ids: vec![token_id.to_string()],
        };
        let transaction_id = self.execute_transaction(account_id, intent).await?;
        self.wait_for_transaction_surfacing(&transaction_id).await;
        Ok(transaction_id)
    }

    pub async fn dissociate_token(
        &self,
        account_id: &str,
        token_id: &str,
    ) -> Result<String, WalletError> {
        let intent = TransactionIntent::TokenDissociate {
            account_id: account_id.to_string(),
            token_ids: vec![token_id.to_string()],
        };
        let transaction_id = self.execute_transaction(account_id, intent).await?;
        self.wait_for_transaction_surfacing(&transaction_id).await;
        Ok(transaction_id)
    }

    async fn execute_transaction(
        &self,
        account_id: &str,
        intent: TransactionIntent,
    ) -> Result<String, WalletError> {
        let signer = self
            .signers
            .signer_for(account_id)
            .ok_or_else(|| WalletError::CallFailure("Signer not found (bug)".to_string()))?;

        let frozen = match signer.freeze(&intent).await {
            Ok(frozen) => frozen,
            Err(reason) => return Err(classify(signer.as_ref(), reason)),
        };
        let response = match signer.submit(frozen).await {
            Ok(response) => response,
            Err(reason) => return Err(classify(signer.as_ref(), reason)),
        };
        // Some wallets answer a rejected prompt with no response at all;
        // treat that exactly like a recognized cancel error.
        let response = response.ok_or(WalletError::Cancelled)?;

        let transaction_id = txid::normalize(&response.transaction_id)
            .map_err(|e| WalletError::CallFailure(e.to_string()))?;
        log::info!("[wallet] submitted {transaction_id}");
        Ok(transaction_id)
    }

    /// Best-effort wait for the mirror node to index a submitted transaction.
    /// Bounded retries with fixed spacing; exhaustion and polling errors are
    /// both non-fatal.
    async fn wait_for_transaction_surfacing(&self, transaction_id: &str) {
        for attempt in 1..=self.surfacing_attempts {
            tokio::time::sleep(self.surfacing_interval).await;
            match self.transactions.refresh(transaction_id.to_string()).await {
                Ok(Some(_)) => {
                    log::debug!("[wallet] {transaction_id} surfaced (attempt {attempt})");
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("[wallet] surfacing poll for {transaction_id} failed: {e}");
                    return;
                }
            }
        }
        log::debug!(
            "[wallet] {transaction_id} not surfaced after {} attempts",
            self.surfacing_attempts
        );
    }
}

fn classify(signer: &dyn TransactionSigner, reason: anyhow::Error) -> WalletError {
    if signer.is_cancel(&reason) {
        WalletError::Cancelled
    } else {
        WalletError::CallFailure(reason.to_string())
    }
}
