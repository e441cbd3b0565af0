//! Caller-supplied cancellation and deadline signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why a context stopped an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Interrupt {
    #[error("operation canceled")]
    Canceled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation handle threaded through every public operation.
///
/// Clones share the cancellation flag, so one clone can cancel work running under another.
#[derive(Clone, Debug, Default)]
pub struct Context {
    canceled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Some` once the context is canceled or past its deadline.
    pub fn interrupt(&self) -> Option<Interrupt> {
        if self.is_canceled() {
            return Some(Interrupt::Canceled);
        }
        match self.deadline {
            Some(d) if Instant::now() >= d => Some(Interrupt::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), Interrupt> {
        match self.interrupt() {
            Some(i) => Err(i),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Context::background();
        assert_eq!(ctx.check(), Ok(()));
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let other = ctx.clone();
        other.cancel();
        assert_eq!(ctx.interrupt(), Some(Interrupt::Canceled));
    }

    #[test]
    fn elapsed_deadline_interrupts() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert_eq!(ctx.check(), Err(Interrupt::DeadlineExceeded));
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(60))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn cancel_takes_precedence_over_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        ctx.cancel();
        assert_eq!(ctx.interrupt(), Some(Interrupt::Canceled));
    }
}
