//! Scoped use of a session with guaranteed cleanup

use crate::git::{CheckoutMode, SparseCheckoutSession};
use anyhow::Result;
use core::ops::{Deref, DerefMut};
use tracing::warn;

/// Guard returned by [`SparseCheckoutSession::enter`]
///
/// Dereferences to the session. The clone directory is removed when the
/// guard is dropped; use [`ScopedSession::close`] to observe cleanup errors.
#[must_use = "dropping the guard immediately removes the clone"]
pub struct ScopedSession<'s, 'sys> {
    session: &'s mut SparseCheckoutSession<'sys>,
    closed: bool,
}

impl ScopedSession<'_, '_> {
    /// Remove the clone now, returning any cleanup failure
    ///
    /// # Errors
    ///
    /// Returns a filesystem error if the directory cannot be removed
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.session.cleanup()
    }
}

impl<'sys> Deref for ScopedSession<'_, 'sys> {
    type Target = SparseCheckoutSession<'sys>;

    fn deref(&self) -> &Self::Target {
        self.session
    }
}

impl DerefMut for ScopedSession<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
    }
}

impl Drop for ScopedSession<'_, '_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.session.cleanup() {
            warn!("Failed to clean up {}: {e:#}", self.session.repo_dir().display());
        }
    }
}

impl<'sys> SparseCheckoutSession<'sys> {
    /// Clone, enable sparse checkout in `mode`, and hand back a guard that
    /// cleans up when it goes out of scope
    ///
    /// A failed clone leaves the directory to git, which removes what it
    /// created and never touches a pre-existing non-empty directory. Once the
    /// clone exists, a failure to enable sparse checkout removes it before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns the clone or sparse-checkout error
    pub fn enter(&mut self, mode: CheckoutMode) -> Result<ScopedSession<'_, 'sys>> {
        self.clone_repository()?;

        // From here on a failure drops the guard, which cleans up
        let guard = ScopedSession {
            session: self,
            closed: false,
        };
        guard.session.enable_sparse_checkout(mode)?;
        Ok(guard)
    }

    /// Run `body` inside [`enter`](Self::enter), cleaning up on every exit
    ///
    /// An error from `body` takes precedence over a cleanup error.
    ///
    /// # Errors
    ///
    /// Returns the setup error, the error from `body`, or the cleanup error
    pub fn scoped<T, F>(&mut self, mode: CheckoutMode, body: F) -> Result<T>
    where
        F: FnOnce(&mut SparseCheckoutSession<'sys>) -> Result<T>,
    {
        let mut guard = self.enter(mode)?;
        let result = body(&mut *guard);
        let cleanup = guard.close();

        match (result, cleanup) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
            (Err(body_err), Ok(())) => Err(body_err),
            (Err(body_err), Err(cleanup_err)) => {
                warn!("Cleanup also failed: {cleanup_err:#}");
                Err(body_err)
            }
        }
    }
}
