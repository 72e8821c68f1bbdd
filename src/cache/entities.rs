//! Concrete entity caches.
//!
//! Each cache is an [`EntityCache`] configured with a loader that issues one
//! GET through [`MirrorClient`]; 404 resolves to the absent sentinel, every
//! other failure propagates unchanged. No retries here - retry policy belongs
//! to the caller.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::watch;

use crate::mirror_api::MirrorClient;
use crate::types::{
    Contract, ContractLogsResponse, Nft, Token, TokenRelationshipsResponse, Transaction,
    TransactionsResponse,
};

use super::lookup::{make_composite_lookup, split_composite, EntityLookup};
use super::{CacheRegistry, EntityCache, EntityLoader};

struct ContractByIdLoader {
    client: MirrorClient,
}

#[async_trait]
impl EntityLoader<String, Contract> for ContractByIdLoader {
    async fn load(&self, contract_id: &String) -> Result<Option<Contract>> {
        self.client
            .get_json(&format!("api/v1/contracts/{contract_id}"), &[])
            .await
    }
}

struct ContractByAddressLoader {
    client: MirrorClient,
    /// Contracts fetched by EVM address are also known by contract id;
    /// successful loads prime the by-id cache so the UI's second lookup is
    /// free.
    by_id: Arc<EntityCache<String, Contract>>,
}

#[async_trait]
impl EntityLoader<String, Contract> for ContractByAddressLoader {
    async fn load(&self, address: &String) -> Result<Option<Contract>> {
        let contract: Option<Contract> = self
            .client
            .get_json(&format!("api/v1/contracts/{address}"), &[])
            .await?;
        if let Some(contract) = &contract {
            if let Some(contract_id) = &contract.contract_id {
                self.by_id.prime(contract_id.clone(), Some(contract.clone()));
            }
        }
        Ok(contract)
    }
}

struct ContractLogsLoader {
    client: MirrorClient,
}

#[async_trait]
impl EntityLoader<String, ContractLogsResponse> for ContractLogsLoader {
    async fn load(&self, contract_id: &String) -> Result<Option<ContractLogsResponse>> {
        self.client
            .get_json(
                &format!("api/v1/contracts/{contract_id}/results/logs"),
                &[("limit", "100"), ("order", "desc")],
            )
            .await
    }
}

struct NftBySerialLoader {
    client: MirrorClient,
}

#[async_trait]
impl EntityLoader<String, Nft> for NftBySerialLoader {
    async fn load(&self, key: &String) -> Result<Option<Nft>> {
        let (token_id, serial) =
            split_composite(key).ok_or_else(|| anyhow!("Malformed nft cache key '{key}'"))?;
        self.client
            .get_json(&format!("api/v1/tokens/{token_id}/nfts/{serial}"), &[])
            .await
    }
}

struct TransactionByIdLoader {
    client: MirrorClient,
}

#[async_trait]
impl EntityLoader<String, Transaction> for TransactionByIdLoader {
    async fn load(&self, transaction_id: &String) -> Result<Option<Transaction>> {
        let response: Option<TransactionsResponse> = self
            .client
            .get_json(&format!("api/v1/transactions/{transaction_id}"), &[])
            .await?;
        // The endpoint answers with a listing; an empty one counts as absent.
        Ok(response.and_then(|r| r.transactions.into_iter().next()))
    }
}

struct TokenByIdLoader {
    client: MirrorClient,
}

#[async_trait]
impl EntityLoader<String, Token> for TokenByIdLoader {
    async fn load(&self, token_id: &String) -> Result<Option<Token>> {
        self.client
            .get_json(&format!("api/v1/tokens/{token_id}"), &[])
            .await
    }
}

struct TokensByAccountLoader {
    client: MirrorClient,
}

#[async_trait]
impl EntityLoader<String, TokenRelationshipsResponse> for TokensByAccountLoader {
    async fn load(&self, account_id: &String) -> Result<Option<TokenRelationshipsResponse>> {
        self.client
            .get_json(&format!("api/v1/accounts/{account_id}/tokens"), &[])
            .await
    }
}

pub fn contract_by_id(client: MirrorClient) -> Arc<EntityCache<String, Contract>> {
    EntityCache::new("contract-by-id", Arc::new(ContractByIdLoader { client }))
}

pub fn contract_by_address(
    client: MirrorClient,
    by_id: Arc<EntityCache<String, Contract>>,
) -> Arc<EntityCache<String, Contract>> {
    EntityCache::new(
        "contract-by-address",
        Arc::new(ContractByAddressLoader { client, by_id }),
    )
}

pub fn contract_logs_by_contract_id(
    client: MirrorClient,
) -> Arc<EntityCache<String, ContractLogsResponse>> {
    EntityCache::new(
        "contract-logs-by-contract-id",
        Arc::new(ContractLogsLoader { client }),
    )
}

pub fn nft_by_serial(client: MirrorClient) -> Arc<EntityCache<String, Nft>> {
    EntityCache::new("nft-by-serial", Arc::new(NftBySerialLoader { client }))
}

pub fn transaction_by_id(client: MirrorClient) -> Arc<EntityCache<String, Transaction>> {
    EntityCache::new(
        "transaction-by-id",
        Arc::new(TransactionByIdLoader { client }),
    )
}

pub fn token_by_id(client: MirrorClient) -> Arc<EntityCache<String, Token>> {
    EntityCache::new("token-by-id", Arc::new(TokenByIdLoader { client }))
}

pub fn tokens_by_account(
    client: MirrorClient,
) -> Arc<EntityCache<String, TokenRelationshipsResponse>> {
    EntityCache::new(
        "tokens-by-account",
        Arc::new(TokensByAccountLoader { client }),
    )
}

/// Binds reactive token-id and serial-number inputs to the NFT cache; the
/// lookup stays inactive until both inputs are present.
pub fn make_nft_lookup(
    cache: Arc<EntityCache<String, Nft>>,
    token_id: watch::Receiver<Option<String>>,
    serial: watch::Receiver<Option<String>>,
) -> EntityLookup<Nft> {
    make_composite_lookup(cache, token_id, serial)
}

/// The full cache bundle, constructed once at startup and passed to whoever
/// needs it. The registry clears everything on account or network switch.
pub struct Caches {
    pub contract_by_id: Arc<EntityCache<String, Contract>>,
    pub contract_by_address: Arc<EntityCache<String, Contract>>,
    pub contract_logs_by_contract_id: Arc<EntityCache<String, ContractLogsResponse>>,
    pub nft_by_serial: Arc<EntityCache<String, Nft>>,
    pub transaction_by_id: Arc<EntityCache<String, Transaction>>,
    pub token_by_id: Arc<EntityCache<String, Token>>,
    pub tokens_by_account: Arc<EntityCache<String, TokenRelationshipsResponse>>,
    pub registry: CacheRegistry,
}

impl Caches {
    pub fn new(client: &MirrorClient) -> Self {
        let contract_by_id = contract_by_id(client.clone());
        let contract_by_address = contract_by_address(client.clone(), Arc::clone(&contract_by_id));
        let contract_logs_by_contract_id = contract_logs_by_contract_id(client.clone());
        let nft_by_serial = nft_by_serial(client.clone());
        let transaction_by_id = transaction_by_id(client.clone());
        let token_by_id = token_by_id(client.clone());
        let tokens_by_account = tokens_by_account(client.clone());

        let registry = CacheRegistry::new();
        registry.register(contract_by_id.clone());
        registry.register(contract_by_address.clone());
        registry.register(contract_logs_by_contract_id.clone());
        registry.register(nft_by_serial.clone());
        registry.register(transaction_by_id.clone());
        registry.register(token_by_id.clone());
        registry.register(tokens_by_account.clone());

        Self {
            contract_by_id,
            contract_by_address,
            contract_logs_by_contract_id,
            nft_by_serial,
            transaction_by_id,
            token_by_id,
            tokens_by_account,
            registry,
        }
    }

    pub fn clear_all(&self) {
        self.registry.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MirrorClient {
        MirrorClient::with_base_url(&server.uri(), 2_000)
    }

    fn sample_contract() -> serde_json::Value {
        serde_json::json!({
            "contract_id": "0.0.749619",
            "evm_address": "0x00000000000000000000000000000000000b70b3",
            "memo": "",
            "deleted": false
        })
    }

    #[tokio::test]
    async fn contract_logs_request_carries_fixed_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/contracts/0.0.749619/results/logs"))
            .and(query_param("limit", "100"))
            .and(query_param("order", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "logs": [{
                    "contract_id": "0.0.749619",
                    "data": "0x0000000000000000000000000000000000000000000000000000000000000fa0",
                    "index": 0,
                    "topics": ["0xe8d4e6a4"]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let cache = contract_logs_by_contract_id(client_for(&server));
        let logs = cache.lookup("0.0.749619".to_string()).await.unwrap();
        assert_eq!(logs.unwrap().logs.len(), 1);
    }

    #[tokio::test]
    async fn nft_by_serial_splits_the_composite_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tokens/0.0.748383/nfts/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_id": "0.0.748383",
                "serial_number": 2,
                "account_id": "0.0.700000"
            })))
            .mount(&server)
            .await;

        let cache = nft_by_serial(client_for(&server));
        let nft = cache.lookup("0.0.748383---2".to_string()).await.unwrap();
        assert_eq!(nft.unwrap().serial_number, Some(2));

        let err = cache.lookup("no-separator".to_string()).await.unwrap_err();
        assert!(err.to_string().contains("Malformed nft cache key"));
    }

    #[tokio::test]
    async fn nft_404_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cache = nft_by_serial(client_for(&server));
        let nft = cache.lookup("0.0.748383---99".to_string()).await.unwrap();
        assert!(nft.is_none());
        assert!(cache.contains(&"0.0.748383---99".to_string()));
    }

    #[tokio::test]
    async fn transaction_lookup_unwraps_the_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/transactions/0.0.88-1640088354-432870240"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transactions": [{
                    "transaction_id": "0.0.88-1640088354-432870240",
                    "result": "SUCCESS"
                }]
            })))
            .mount(&server)
            .await;

        let cache = transaction_by_id(client_for(&server));
        let tx = cache
            .lookup("0.0.88-1640088354-432870240".to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.result.as_deref(), Some("SUCCESS"));
    }

    #[tokio::test]
    async fn empty_transaction_listing_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"transactions": []})),
            )
            .mount(&server)
            .await;

        let cache = transaction_by_id(client_for(&server));
        let tx = cache.lookup("0.0.88-1-2".to_string()).await.unwrap();
        assert!(tx.is_none());
    }

    #[tokio::test]
    async fn contract_by_address_primes_contract_by_id() {
        let server = MockServer::start().await;
        let evm_address = "0x00000000000000000000000000000000000b70b3";
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/contracts/{evm_address}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_contract()))
            .expect(1)
            .mount(&server)
            .await;

        let caches = Caches::new(&client_for(&server));
        let contract = caches
            .contract_by_address
            .lookup(evm_address.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contract.contract_id.as_deref(), Some("0.0.749619"));

        // The by-id cache was primed: no second request happens.
        assert!(caches.contract_by_id.contains(&"0.0.749619".to_string()));
        let again = caches
            .contract_by_id
            .lookup("0.0.749619".to_string())
            .await
            .unwrap();
        assert_eq!(again.unwrap().evm_address.as_deref(), Some(evm_address));
    }

    #[tokio::test]
    async fn clear_all_empties_every_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_contract()))
            .mount(&server)
            .await;

        let caches = Caches::new(&client_for(&server));
        caches
            .contract_by_id
            .lookup("0.0.749619".to_string())
            .await
            .unwrap();
        assert!(!caches.registry.all_empty());

        caches.clear_all();
        assert!(caches.registry.all_empty());
        assert!(caches.contract_by_id.is_empty());
    }
}
