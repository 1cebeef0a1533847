//! Run control: cancellation and deadline for one provisioning run
//!
//! Checked at every step boundary and before every row insert. A tripped
//! control fails the current step, which then unwinds like any other
//! failure. Compensation never consults the control.

use crate::error::StepCause;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RunControl {
    /// Control that never trips on its own
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Trip at `deadline`
    #[inline]
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Trip after `timeout` from now
    #[inline]
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Deadline, if any
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Token callers can use to cancel the run
    #[inline]
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation
    #[inline]
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail if the run was cancelled or its deadline has passed
    ///
    /// # Errors
    /// - `StepCause::Cancelled` once the token is cancelled
    /// - `StepCause::DeadlineExceeded` once the deadline has passed
    pub fn checkpoint(&self) -> Result<(), StepCause> {
        if self.cancel.is_cancelled() {
            return Err(StepCause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StepCause::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
