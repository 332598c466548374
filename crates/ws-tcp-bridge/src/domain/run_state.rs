//! Process-wide run state.
//!
//! Two flags live here:
//!
//! - **exiting**: "exit after this session".  Set at most once, only ever
//!   `false → true`, and only in single-shot mode.  Once set, every new request
//!   is refused without an upgrade.
//! - **running**: cleared to stop the accept loop.  Cleared by the single-shot
//!   session when it ends (through [`ShutdownGuard`]) or by Ctrl+C.
//!
//! Both are plain atomics: the exit flag only gates *future* admissions, so a
//! request racing with the transition either wins [`RunState::try_begin_session`]
//! or is refused.  It never interferes with a session already in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared lifecycle gate for all connection tasks.
#[derive(Debug)]
pub struct RunState {
    run_once: bool,
    exiting: AtomicBool,
    running: AtomicBool,
}

impl RunState {
    pub fn new(run_once: bool) -> Self {
        Self {
            run_once,
            exiting: AtomicBool::new(false),
            running: AtomicBool::new(true),
        }
    }

    pub fn run_once(&self) -> bool {
        self.run_once
    }

    /// `true` once the single-shot session has been admitted.
    pub fn is_exiting(&self) -> bool {
        self.exiting.load(Ordering::Acquire)
    }

    /// Admits an upgrade attempt.
    ///
    /// Outside single-shot mode this always succeeds.  In single-shot mode the
    /// first caller flips the exit flag and wins; every later (or concurrent)
    /// caller gets `false` and must not attempt an upgrade.
    pub fn try_begin_session(&self) -> bool {
        if !self.run_once {
            return true;
        }
        self.exiting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Asks the accept loop to stop.  Idempotent.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Stops the server when dropped.
///
/// Held by the task serving the single-shot request, so whichever way that
/// request ends (rejected handshake, failed upgrade, failed dial, finished
/// relay) the process winds down afterwards.
#[derive(Debug)]
pub struct ShutdownGuard {
    state: Arc<RunState>,
}

impl ShutdownGuard {
    pub fn new(state: Arc<RunState>) -> Self {
        Self { state }
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.state.request_shutdown();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_running_and_not_exiting() {
        let state = RunState::new(true);
        assert!(state.is_running());
        assert!(!state.is_exiting());
    }

    #[test]
    fn test_multi_session_mode_admits_every_session() {
        // Arrange
        let state = RunState::new(false);
        // Act / Assert: never flips the exit flag
        assert!(state.try_begin_session());
        assert!(state.try_begin_session());
        assert!(!state.is_exiting());
    }

    #[test]
    fn test_single_shot_admits_only_first_session() {
        let state = RunState::new(true);

        assert!(state.try_begin_session(), "first attempt must be admitted");
        assert!(state.is_exiting());
        assert!(!state.try_begin_session(), "second attempt must be refused");
        assert!(state.is_exiting(), "exit flag is never reset");
    }

    #[test]
    fn test_single_shot_admission_is_exclusive_across_threads() {
        // Arrange: many threads race for the single slot
        let state = Arc::new(RunState::new(true));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || state.try_begin_session())
            })
            .collect();

        // Act
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        // Assert
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_request_shutdown_is_idempotent() {
        let state = RunState::new(false);
        state.request_shutdown();
        state.request_shutdown();
        assert!(!state.is_running());
    }

    #[test]
    fn test_shutdown_guard_stops_server_on_drop() {
        let state = Arc::new(RunState::new(true));
        let guard = ShutdownGuard::new(Arc::clone(&state));
        assert!(state.is_running());

        drop(guard);

        assert!(!state.is_running());
    }
}
