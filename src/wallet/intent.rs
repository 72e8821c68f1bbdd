//! Built-but-unsigned ledger transactions.

use super::error::WalletError;

/// Sentinel node id meaning "not staked to any node".
pub const UNSTAKED_NODE_ID: i64 = -1;
/// Sentinel zero-address meaning "not staked to any account".
pub const UNSTAKED_ACCOUNT_ID: &str = "0.0.0";
/// Upper bound on per-serial NFT allowance approvals in one transaction.
pub const MAX_NFT_ALLOWANCE_SERIALS: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub enum NftAllowanceScope {
    /// Approve every serial of the token, present and future.
    AllSerials,
    /// Approve the listed serials individually (1 to 20 of them).
    Serials(Vec<i64>),
}

/// A built ledger transaction, owned by the driver only for the duration of
/// one call. Amounts are in the ledger's smallest denomination.
#[derive(Clone, Debug, PartialEq)]
pub enum TransactionIntent {
    AccountUpdate {
        account_id: String,
        staked_node_id: Option<i64>,
        staked_account_id: Option<String>,
        decline_reward: Option<bool>,
    },
    ApproveHbarAllowance {
        owner: String,
        spender: String,
        amount: i64,
    },
    ApproveTokenAllowance {
        owner: String,
        token_id: String,
        spender: String,
        amount: i64,
    },
    ApproveNftAllowance {
        owner: String,
        token_id: String,
        spender: String,
        scope: NftAllowanceScope,
    },
    TokenAssociate {
        account_id: String,
        token_ids: Vec<String>,
    },
    TokenDissociate {
        account_id: String,
        token_ids: Vec<String>,
    },
}

impl TransactionIntent {
    /// Builds a staking change. At most one staking target is honored, node
    /// id first; with neither present the transaction explicitly clears
    /// staking via the sentinel node id and zero-address - a deliberate
    /// "unstake" encoding, not an omission.
    pub fn staking_change(
        account_id: &str,
        staked_node_id: Option<i64>,
        staked_account_id: Option<String>,
        decline_reward: Option<bool>,
    ) -> Self {
        let (node, account) = match (staked_node_id, staked_account_id) {
            (Some(node), _) => (Some(node), None),
            (None, Some(account)) => (None, Some(account)),
            (None, None) => (
                Some(UNSTAKED_NODE_ID),
                Some(UNSTAKED_ACCOUNT_ID.to_string()),
            ),
        };
        TransactionIntent::AccountUpdate {
            account_id: account_id.to_string(),
            staked_node_id: node,
            staked_account_id: account,
            decline_reward,
        }
    }

    /// Builds an NFT allowance approval. An empty serial list means "approve
    /// all serials"; 1 to 20 serials are approved individually; anything
    /// longer is rejected before any signer or network call.
    pub fn nft_allowance(
        owner: &str,
        token_id: &str,
        spender: &str,
        serials: Vec<i64>,
    ) -> Result<Self, WalletError> {
        let scope = match serials.len() {
            0 => NftAllowanceScope::AllSerials,
            1..=MAX_NFT_ALLOWANCE_SERIALS => NftAllowanceScope::Serials(serials),
            n => {
                return Err(WalletError::InvalidInput(format!(
                    "Invalid serial number count ({n})"
                )))
            }
        };
        Ok(TransactionIntent::ApproveNftAllowance {
            owner: owner.to_string(),
            token_id: token_id.to_string(),
            spender: spender.to_string(),
            scope,
        })
    }

    /// The account expected to pay for and sign this transaction.
    pub fn payer(&self) -> &str {
        match self {
            TransactionIntent::AccountUpdate { account_id, .. } => account_id,
            TransactionIntent::ApproveHbarAllowance { owner, .. } => owner,
            TransactionIntent::ApproveTokenAllowance { owner, .. } => owner,
            TransactionIntent::ApproveNftAllowance { owner, .. } => owner,
            TransactionIntent::TokenAssociate { account_id, .. } => account_id,
            TransactionIntent::TokenDissociate { account_id, .. } => account_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staking_node_id_wins_over_account_id() {
        let intent = TransactionIntent::staking_change(
            "0.0.1234",
            Some(3),
            Some("0.0.5678".to_string()),
            None,
        );
        match intent {
            TransactionIntent::AccountUpdate {
                staked_node_id,
                staked_account_id,
                ..
            } => {
                assert_eq!(staked_node_id, Some(3));
                assert_eq!(staked_account_id, None);
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn staking_with_neither_target_is_an_explicit_unstake() {
        let intent = TransactionIntent::staking_change("0.0.1234", None, None, Some(false));
        match intent {
            TransactionIntent::AccountUpdate {
                staked_node_id,
                staked_account_id,
                decline_reward,
                ..
            } => {
                assert_eq!(staked_node_id, Some(UNSTAKED_NODE_ID));
                assert_eq!(staked_account_id.as_deref(), Some(UNSTAKED_ACCOUNT_ID));
                assert_eq!(decline_reward, Some(false));
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn nft_allowance_serial_count_window() {
        let all = TransactionIntent::nft_allowance("0.0.1", "0.0.2", "0.0.3", vec![]).unwrap();
        assert!(matches!(
            all,
            TransactionIntent::ApproveNftAllowance {
                scope: NftAllowanceScope::AllSerials,
                ..
            }
        ));

        let twenty: Vec<i64> = (1..=20).collect();
        assert!(TransactionIntent::nft_allowance("0.0.1", "0.0.2", "0.0.3", twenty).is_ok());

        let too_many: Vec<i64> = (1..=21).collect();
        let err =
            TransactionIntent::nft_allowance("0.0.1", "0.0.2", "0.0.3", too_many).unwrap_err();
        assert!(err.to_string().contains("Invalid serial number count (21)"));
    }
}
