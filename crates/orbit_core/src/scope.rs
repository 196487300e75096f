//! crates/orbit_core/src/scope.rs
//!
//! Request scopes. A view creates a `ViewScope` when it mounts and cancels it
//! when it goes away; requests issued under the scope stop mutating state once
//! it is cancelled.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::ports::{PortError, PortResult};

#[derive(Debug, Clone, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A scope that is cancelled together with this one, or on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs `fut` unless the scope is cancelled first.
    ///
    /// The result is also rejected if cancellation happened while the future was
    /// completing, so callers may commit it to the store without re-checking.
    pub async fn run<T, F>(&self, fut: F) -> PortResult<T>
    where
        F: Future<Output = PortResult<T>>,
    {
        if self.is_cancelled() {
            return Err(PortError::Cancelled);
        }
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(PortError::Cancelled),
            result = fut => result,
        };
        if self.is_cancelled() {
            return Err(PortError::Cancelled);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn live_scope_passes_results_through() {
        let scope = ViewScope::new();
        let value = scope.run(async { Ok::<_, PortError>(7) }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn cancelled_scope_rejects_before_running() {
        let scope = ViewScope::new();
        scope.cancel();
        let value = scope.run(async { Ok::<_, PortError>(7) }).await;
        assert_eq!(value, Err(PortError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_in_flight_work() {
        let scope = ViewScope::new();
        let canceller = scope.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let value = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, PortError>(1)
            })
            .await;
        assert_eq!(value, Err(PortError::Cancelled));
    }

    #[tokio::test]
    async fn child_follows_parent() {
        let parent = ViewScope::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
