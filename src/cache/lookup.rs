//! Reactive lookups: watch-channel driven bindings from a key to the cached
//! value for that key.
//!
//! A lookup owns a background task that re-runs the cache lookup whenever the
//! key changes. A result is only published if the key is still current when
//! the load resolves, so a late result for a superseded key never overwrites
//! state belonging to the newer key.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::EntityCache;

/// Reserved separator for composite cache keys. Must not occur in either
/// sub-key or the composite form is ambiguous.
pub const COMPOSITE_SEPARATOR: &str = "---";

/// Current value of a reactive lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum LookupState<V> {
    /// The key is null; nothing to look up.
    Inactive,
    /// A load for the current key is in flight.
    Loading,
    Found(V),
    /// The backend confirmed the entity does not exist.
    Absent,
    /// The load failed; the next key change retries.
    Failed(String),
}

impl<V> LookupState<V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            LookupState::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LookupState::Loading)
    }
}

/// Handle on a reactive lookup. Dropping it stops the background tasks.
pub struct EntityLookup<V> {
    state_rx: watch::Receiver<LookupState<V>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<V: Clone> EntityLookup<V> {
    /// Snapshot of the current state.
    pub fn state(&self) -> LookupState<V> {
        self.state_rx.borrow().clone()
    }

    /// A receiver that observes every published state change.
    pub fn subscribe(&self) -> watch::Receiver<LookupState<V>> {
        self.state_rx.clone()
    }
}

impl<V> Drop for EntityLookup<V> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Binds a reactive (possibly null) key to `cache`'s value for that key.
pub fn make_lookup<K, V>(
    cache: Arc<EntityCache<K, V>>,
    mut key_rx: watch::Receiver<Option<K>>,
) -> EntityLookup<V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let (state_tx, state_rx) = watch::channel(LookupState::Inactive);
    let task = tokio::spawn(async move {
        loop {
            let key = key_rx.borrow_and_update().clone();
            match key {
                None => {
                    let _ = state_tx.send(LookupState::Inactive);
                }
                Some(k) => {
                    let _ = state_tx.send(LookupState::Loading);
                    let outcome = cache.lookup(k.clone()).await;
                    // Publish against the key as it is *now*, not as it was
                    // when the load started.
                    if key_rx.borrow().as_ref() == Some(&k) {
                        let next = match outcome {
                            Ok(Some(v)) => LookupState::Found(v),
                            Ok(None) => LookupState::Absent,
                            Err(e) => LookupState::Failed(e.to_string()),
                        };
                        let _ = state_tx.send(next);
                    }
                }
            }
            if key_rx.changed().await.is_err() {
                break;
            }
        }
    });
    EntityLookup {
        state_rx,
        tasks: vec![task],
    }
}

/// Joins two sub-keys into a composite cache key; `None` unless both parts
/// are present.
pub fn composite_key(a: &Option<String>, b: &Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(format!("{a}{COMPOSITE_SEPARATOR}{b}")),
        _ => None,
    }
}

/// Splits a composite key back into its two parts.
pub fn split_composite(key: &str) -> Option<(&str, &str)> {
    key.split_once(COMPOSITE_SEPARATOR)
}

/// Binds two independent reactive inputs to a composite-keyed cache. The
/// composite key is recomputed whenever either input changes; while either
/// input is null there is no key and the lookup stays inactive.
pub fn make_composite_lookup<V>(
    cache: Arc<EntityCache<String, V>>,
    mut a_rx: watch::Receiver<Option<String>>,
    mut b_rx: watch::Receiver<Option<String>>,
) -> EntityLookup<V>
where
    V: Clone + Send + Sync + 'static,
{
    let initial = composite_key(&a_rx.borrow_and_update(), &b_rx.borrow_and_update());
    let (key_tx, key_rx) = watch::channel(initial);
    let combiner = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = a_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = b_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            let key = composite_key(&a_rx.borrow_and_update(), &b_rx.borrow_and_update());
            if key_tx.send(key).is_err() {
                break;
            }
        }
    });
    let mut lookup = make_lookup(cache, key_rx);
    lookup.tasks.push(combiner);
    lookup
}
