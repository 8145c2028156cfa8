use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether removals are being replayed from the write-ahead log
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryMode {
    #[default]
    Normal,
    Replay,
}

impl RecoveryMode {
    pub fn is_replay(self) -> bool {
        self == RecoveryMode::Replay
    }
}

/// Shared recovery indicator owned by the storage engine
///
/// Clones observe the same flag. Writers read it once per commit.
#[derive(Clone, Debug, Default)]
pub struct RecoveryFlag(Arc<AtomicBool>);

impl RecoveryFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_in_recovery(&self, in_recovery: bool) {
        self.0.store(in_recovery, Ordering::Release);
    }

    pub fn in_recovery(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn mode(&self) -> RecoveryMode {
        if self.in_recovery() {
            RecoveryMode::Replay
        } else {
            RecoveryMode::Normal
        }
    }
}
