//! Mirror-node REST schema types.
//!
//! Only the fields the explorer core actually consumes are modeled; unknown
//! fields in mirror-node payloads are ignored.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: Option<String>,
    pub evm_address: Option<String>,
    pub file_id: Option<String>,
    pub memo: Option<String>,
    pub created_timestamp: Option<String>,
    pub expiration_timestamp: Option<String>,
    pub deleted: Option<bool>,
    pub auto_renew_period: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractLog {
    pub address: Option<String>,
    pub contract_id: Option<String>,
    /// Hex-encoded event payload.
    pub data: Option<String>,
    pub index: Option<u64>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub timestamp: Option<String>,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractLogsResponse {
    #[serde(default)]
    pub logs: Vec<ContractLog>,
    pub links: Option<Links>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nft {
    pub account_id: Option<String>,
    pub token_id: Option<String>,
    pub serial_number: Option<i64>,
    /// Base64-encoded metadata blob (commonly an IPFS URI).
    pub metadata: Option<String>,
    pub deleted: Option<bool>,
    pub spender: Option<String>,
    pub created_timestamp: Option<String>,
    pub modified_timestamp: Option<String>,
}

impl Nft {
    /// Decodes the base64 metadata to text, if it is present and valid UTF-8.
    pub fn decoded_metadata(&self) -> Option<String> {
        let raw = self.metadata.as_deref()?;
        let bytes = BASE64.decode(raw).ok()?;
        String::from_utf8(bytes).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub account: Option<String>,
    pub amount: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: Option<String>,
    pub consensus_timestamp: Option<String>,
    pub name: Option<String>,
    pub result: Option<String>,
    pub entity_id: Option<String>,
    pub charged_tx_fee: Option<i64>,
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub links: Option<Links>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_id: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    /// The mirror node reports decimals as a string.
    pub decimals: Option<String>,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRelationship {
    pub token_id: Option<String>,
    pub balance: Option<i64>,
    pub automatic_association: Option<bool>,
    pub created_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRelationshipsResponse {
    #[serde(default)]
    pub tokens: Vec<TokenRelationship>,
    pub links: Option<Links>,
}
