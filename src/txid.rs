//! Transaction-id handling.
//!
//! The ledger SDK reports transaction ids as `0.0.88@1640088354.432870240`
//! while the mirror node query API expects `0.0.88-1640088354-432870240`.
//! Both forms parse; the dashed mirror form with nine-digit nanoseconds is
//! the canonical output everywhere in this crate.

use anyhow::{anyhow, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionId {
    pub payer: String,
    pub seconds: u64,
    pub nanos: u32,
}

impl TransactionId {
    pub fn parse(input: &str) -> Result<Self> {
        let s = input.trim();
        if let Some((payer, stamp)) = s.split_once('@') {
            let (seconds, nanos) = stamp
                .split_once('.')
                .ok_or_else(|| anyhow!("Invalid transaction id '{s}'"))?;
            Self::assemble(payer, seconds, nanos, s)
        } else {
            // Mirror form: payer-seconds-nanos. The payer contains dots but
            // no dashes, so splitting from the right is unambiguous.
            let mut parts = s.rsplitn(3, '-');
            let nanos = parts.next();
            let seconds = parts.next();
            let payer = parts.next();
            match (payer, seconds, nanos) {
                (Some(payer), Some(seconds), Some(nanos)) => {
                    Self::assemble(payer, seconds, nanos, s)
                }
                _ => Err(anyhow!("Invalid transaction id '{s}'")),
            }
        }
    }

    fn assemble(payer: &str, seconds: &str, nanos: &str, original: &str) -> Result<Self> {
        let shards = payer.split('.').count() == 3
            && payer.split('.').all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        if !shards {
            return Err(anyhow!("Invalid payer account in transaction id '{original}'"));
        }
        let seconds = seconds
            .parse::<u64>()
            .map_err(|_| anyhow!("Invalid seconds in transaction id '{original}'"))?;
        let nanos = nanos
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid nanos in transaction id '{original}'"))?;
        if nanos > 999_999_999 {
            return Err(anyhow!("Invalid nanos in transaction id '{original}'"));
        }
        Ok(Self {
            payer: payer.to_string(),
            seconds,
            nanos,
        })
    }

    /// Canonical dashed form understood by the mirror node REST API.
    pub fn to_mirror_format(&self) -> String {
        format!("{}-{}-{:09}", self.payer, self.seconds, self.nanos)
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_mirror_format())
    }
}

/// Normalizes any accepted transaction-id form to the canonical mirror form.
pub fn normalize(id: &str) -> Result<String> {
    Ok(TransactionId::parse(id)?.to_mirror_format())
}
