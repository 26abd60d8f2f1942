//! Fanout state machine
//!
//! ```text
//!            timer, no active clients
//!          ┌──────────┐
//!          ▼          │
//!        Idle ────────┘
//!          │ timer, clients present
//!          ▼
//!      Capturing ──── acquire failed ────► Idle
//!          │ acquire ok
//!          ▼
//!     Broadcasting ── all clients tried ─► Idle
//! ```

/// Phase of the broadcast loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutState {
    /// Waiting for the next tick
    #[default]
    Idle,
    /// Acquiring a frame from the source
    Capturing,
    /// Writing the frame to each active client
    Broadcasting,
}

impl FanoutState {
    /// Tick fired with subscribers present
    pub fn start_capture(&mut self) {
        if *self == FanoutState::Idle {
            *self = FanoutState::Capturing;
        }
    }

    /// Source produced a frame
    pub fn capture_succeeded(&mut self) {
        if *self == FanoutState::Capturing {
            *self = FanoutState::Broadcasting;
        }
    }

    /// Source had no frame; tick skipped
    pub fn capture_failed(&mut self) {
        if *self == FanoutState::Capturing {
            *self = FanoutState::Idle;
        }
    }

    /// Every active client has been tried
    pub fn finish_broadcast(&mut self) {
        if *self == FanoutState::Broadcasting {
            *self = FanoutState::Idle;
        }
    }

    /// Force back to idle after an interrupted tick
    pub fn reset(&mut self) {
        *self = FanoutState::Idle;
    }

    /// Whether the loop is between ticks
    pub fn is_idle(&self) -> bool {
        *self == FanoutState::Idle
    }
}
