//! The embed runtime announces readiness through a single process-wide
//! callback. [`SdkHook`] turns that global slot into scoped subscriptions:
//! at most one owner at a time, released when the [`SdkSubscription`] drops,
//! and a release never clears a slot that someone else owns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use log::{debug, warn};

use crate::errors::{Error, Result};

type ReadyCallback = Arc<dyn Fn() + Send + Sync>;

struct Claim {
    owner: u64,
    callback: ReadyCallback,
}

#[derive(Default)]
struct HookInner {
    slot: Mutex<Option<Claim>>,
    next_owner: AtomicU64,
}

/// Single-owner "runtime ready" hook
#[derive(Clone, Default)]
pub struct SdkHook {
    inner: Arc<HookInner>,
}

impl SdkHook {
    /// The hook shared by everything in this process
    pub fn global() -> &'static SdkHook {
        static GLOBAL: OnceLock<SdkHook> = OnceLock::new();
        GLOBAL.get_or_init(SdkHook::default)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Claim>> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn claim(&self, callback: impl Fn() + Send + Sync + 'static) -> Result<SdkSubscription> {
        let mut slot = self.slot();
        if let Some(existing) = slot.as_ref() {
            warn!("SDK ready hook already claimed by subscriber {}", existing.owner);
            return Err(Error::EmbedError("SDK ready hook is already claimed".into()));
        }
        let owner = self.inner.next_owner.fetch_add(1, Ordering::Relaxed);
        *slot = Some(Claim {
            owner,
            callback: Arc::new(callback),
        });
        debug!("SDK ready hook claimed by subscriber {owner}");
        Ok(SdkSubscription {
            hook: self.clone(),
            owner,
        })
    }

    /// Invoked by the runtime once loaded. Returns whether anyone was listening.
    pub fn fire(&self) -> bool {
        // Call outside the lock so the callback may touch the hook
        let callback = self.slot().as_ref().map(|claim| claim.callback.clone());
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => {
                debug!("SDK ready hook fired with no subscriber");
                false
            }
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.slot().is_some()
    }
}

/// Ownership of the ready hook; released on drop
pub struct SdkSubscription {
    hook: SdkHook,
    owner: u64,
}

impl Drop for SdkSubscription {
    fn drop(&mut self) {
        let mut slot = self.hook.slot();
        if slot.as_ref().is_some_and(|claim| claim.owner == self.owner) {
            *slot = None;
            debug!("SDK ready hook released by subscriber {}", self.owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn second_claim_is_refused_until_release() {
        let hook = SdkHook::default();
        let first = hook.claim(|| {}).unwrap();
        assert!(hook.claim(|| {}).is_err());
        drop(first);
        assert!(!hook.is_claimed());
        let _second = hook.claim(|| {}).unwrap();
        assert!(hook.is_claimed());
    }

    #[test]
    fn fire_reaches_current_owner_only() {
        let hook = SdkHook::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let sub = hook
            .claim(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        assert!(hook.fire());
        drop(sub);
        assert!(!hook.fire());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_may_inspect_the_hook() {
        let hook = SdkHook::default();
        let inner = hook.clone();
        let _sub = hook.claim(move || assert!(inner.is_claimed())).unwrap();
        assert!(hook.fire());
    }
}
