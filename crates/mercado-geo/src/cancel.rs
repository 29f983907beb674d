use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{GeoError, SourceError};

/// Cooperative cancellation for long-running analytics.
///
/// Trips either when [`CancelSignal::cancel`] is called on any clone or when
/// the optional deadline passes. Checked between data-source calls and
/// periodically inside aggregation loops.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that only trips on an explicit [`CancelSignal::cancel`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also trips once `timeout` has elapsed from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// # Errors
    ///
    /// Returns [`GeoError::Cancelled`] if the signal has tripped.
    pub fn check(&self) -> Result<(), GeoError> {
        if self.is_cancelled() {
            Err(GeoError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Await a data-source call, giving up at the deadline.
    ///
    /// An explicit cancel during the call is observed once it returns.
    pub(crate) async fn guard<T, F>(&self, fut: F) -> Result<T, GeoError>
    where
        F: Future<Output = Result<T, SourceError>>,
    {
        self.check()?;
        let out = match self.deadline {
            Some(deadline) => {
                tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), fut)
                    .await
                    .map_err(|_| GeoError::Cancelled)??
            }
            None => fut.await?,
        };
        self.check()?;
        Ok(out)
    }
}
