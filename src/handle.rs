use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::engine::PricingEngine;

/// Shared, atomically replaceable engine.
///
/// Readers call [`load`](Self::load) and keep the returned snapshot for the
/// whole calculation; a concurrent [`replace`](Self::replace) never affects a
/// calculation that already started.
///
/// ```
/// use tariff::{EngineHandle, PricingEngine};
///
/// let handle = EngineHandle::new(PricingEngine::builder().build().unwrap());
/// assert!(handle.load().is_empty());
///
/// let refreshed = PricingEngine::builder()
///     .rule("bulk", |r| r.volume_discount())
///     .build()
///     .unwrap();
/// handle.replace(refreshed);
/// assert_eq!(handle.load().rule_names(), vec!["bulk"]);
/// ```
#[derive(Debug)]
pub struct EngineHandle {
    current: ArcSwap<PricingEngine>,
}

impl EngineHandle {
    #[must_use]
    pub fn new(engine: PricingEngine) -> Self {
        Self {
            current: ArcSwap::from_pointee(engine),
        }
    }

    /// The engine in effect right now.
    #[must_use]
    pub fn load(&self) -> Arc<PricingEngine> {
        self.current.load_full()
    }

    /// Swap in a new engine and return the one it replaced.
    pub fn replace(&self, engine: PricingEngine) -> Arc<PricingEngine> {
        let previous = self.current.swap(Arc::new(engine));
        tracing::debug!(
            previous = previous.len(),
            current = self.current.load().len(),
            "pricing engine replaced"
        );
        previous
    }
}

impl From<PricingEngine> for EngineHandle {
    fn from(engine: PricingEngine) -> Self {
        Self::new(engine)
    }
}
