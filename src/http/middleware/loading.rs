//! Global loading guard.
//!
//! The one piece of shared mutable state in the request path. A semaphore
//! bounds how many private requests run at once, and a busy flag lets
//! maintenance work (upgrades, restores) turn the private API away entirely.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{Flow, Interceptor, RequestContext};
use crate::error::GatewayError;

/// Shared handle to the guard's state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LoadingState {
    permits: Arc<Semaphore>,
    busy: Arc<AtomicBool>,
    capacity: usize,
}

impl LoadingState {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            busy: Arc::new(AtomicBool::new(false)),
            capacity,
        }
    }

    /// Mark the system busy. While set, every private request is refused.
    pub fn set_busy(&self, busy: bool) {
        let was = self.busy.swap(busy, Ordering::SeqCst);
        if was != busy {
            tracing::info!(busy, "Loading state changed");
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Private requests currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

pub struct LoadingGuard {
    state: LoadingState,
}

impl LoadingGuard {
    pub fn new(state: LoadingState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Interceptor for LoadingGuard {
    fn name(&self) -> &'static str {
        "loading"
    }

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow {
        if self.state.is_busy() {
            return GatewayError::GlobalLoading("system is busy").into();
        }
        match self.state.permits.clone().try_acquire_owned() {
            Ok(permit) => {
                ctx.hold(permit);
                Flow::Continue
            }
            Err(_) => {
                tracing::warn!(
                    capacity = self.state.capacity,
                    path = %ctx.path(),
                    "Private request limit reached"
                );
                GatewayError::GlobalLoading("too many concurrent requests").into()
            }
        }
    }
}
