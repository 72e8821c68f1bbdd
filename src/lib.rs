//! mirrorx - headless core of a mirror-node ledger explorer
//!
//! This library provides the pieces that sit between explorer UI surfaces and
//! a mirror-node REST API:
//!
//! - **Entity caches**: keyed, asynchronous, deduplicating caches that memoize
//!   mirror-node payloads for the lifetime of the process (see [`cache`]).
//! - **Reactive lookups**: watch-channel driven bindings from a (possibly
//!   composite) key to the cached value for that key.
//! - **Wallet driver**: builds ledger transactions, signs them through a
//!   pluggable signer, submits them and polls the mirror node until the
//!   transaction surfaces (see [`wallet`]).
//!
//! Rendering, routing and UI state management live elsewhere and call into
//! these contracts.

pub mod cache;
pub mod config;
pub mod mirror_api;
pub mod txid;
pub mod types;
pub mod wallet;
