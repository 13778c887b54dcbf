//! Poison state shared by every encryptor and decryptor.
//!
//! Once an instance fails, it stays failed: nonces and chunk counters may
//! already have moved, and letting the caller "retry" would reuse or skip
//! cryptographic state. Every public method calls [`Lifecycle::check`] first
//! and routes its own failures through [`Lifecycle::guard`].

use tracing::debug;

use crate::error::{Error, Result};

/// Whether an encryptor/decryptor may still be used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Active,
    Poisoned(Error),
}

impl Lifecycle {
    /// Fail with the stored error if poisoned.
    pub fn check(&self) -> Result<()> {
        match self {
            Lifecycle::Active => Ok(()),
            Lifecycle::Poisoned(err) => Err(err.clone()),
        }
    }

    /// Poison with `err` and hand it back for returning.
    ///
    /// The first error wins; poisoning an already poisoned instance keeps the
    /// original error.
    pub fn poison(&mut self, err: Error) -> Error {
        match self {
            Lifecycle::Active => {
                debug!(error = %err, "instance poisoned");
                *self = Lifecycle::Poisoned(err.clone());
                err
            }
            Lifecycle::Poisoned(existing) => existing.clone(),
        }
    }

    /// Pass `result` through, poisoning on `Err`.
    pub fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|err| self.poison(err))
    }

    /// Mark as finalized. Later calls fail with [`Error::AlreadyFinalized`].
    pub fn finish(&mut self) {
        if matches!(self, Lifecycle::Active) {
            *self = Lifecycle::Poisoned(Error::AlreadyFinalized);
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_by_default() {
        let state = Lifecycle::default();
        assert!(state.is_active());
        assert_eq!(state.check(), Ok(()));
    }

    #[test]
    fn test_first_error_sticks() {
        let mut state = Lifecycle::Active;
        let out: Result<()> = state.guard(Err(Error::StreamCorrupted));
        assert_eq!(out, Err(Error::StreamCorrupted));

        // A later, different failure doesn't replace the original.
        assert_eq!(state.poison(Error::DecryptionAuthFailed), Error::StreamCorrupted);
        assert_eq!(state.check(), Err(Error::StreamCorrupted));
    }

    #[test]
    fn test_guard_passes_success_through() {
        let mut state = Lifecycle::Active;
        assert_eq!(state.guard(Ok(7)), Ok(7));
        assert!(state.is_active());
    }

    #[test]
    fn test_finish_reports_already_finalized() {
        let mut state = Lifecycle::Active;
        state.finish();
        assert_eq!(state.check(), Err(Error::AlreadyFinalized));

        // Finishing a failed instance keeps the failure visible.
        let mut failed = Lifecycle::Poisoned(Error::StreamChunkTooBig);
        failed.finish();
        assert_eq!(failed.check(), Err(Error::StreamChunkTooBig));
    }
}
