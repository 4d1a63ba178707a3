//! Scoped release of per-call boundary temporaries
//!
//! Value-returning calls and conversions may hand back a [`CleanupToken`]
//! alongside the result slot: a list of pending release actions for
//! temporaries the host materialized during the call (string buffers,
//! views). The token must be run exactly once per call that produced one,
//! on every exit path - normal return, early `?`, or panic. Binding it to a
//! guard right after the primitive returns is the only correct pattern;
//! running it anywhere else is a bug.

use crate::boundary::{CleanupToken, host};

/// Runs a call's cleanup token when the scope that obtained it exits.
///
/// Construct one immediately after the primitive that produced the token
/// and before decoding the result: the decoded data (e.g. a string buffer)
/// is only valid while the guard is alive.
pub struct CleanupGuard {
    token: Option<CleanupToken>,
}

impl CleanupGuard {
    /// Guard a token. `None` means the call emitted no cleanup obligations;
    /// the guard is then a no-op, which keeps call sites uniform.
    pub fn new(token: Option<CleanupToken>) -> Self {
        Self { token }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            host().run_cleanup(token);
        }
    }
}
