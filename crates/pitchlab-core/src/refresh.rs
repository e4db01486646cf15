// Generation tokens for overlapping refreshes. Each refresh takes a token
// before it starts fetching; only the holder of the newest token may publish.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshToken(u64);

impl RefreshToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RefreshGate {
    latest: AtomicU64,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new refresh, superseding every earlier token.
    pub fn begin(&self) -> RefreshToken {
        RefreshToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no refresh has started since `token` was issued.
    pub fn is_current(&self, token: RefreshToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Generation of the newest token, 0 before the first refresh.
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}
