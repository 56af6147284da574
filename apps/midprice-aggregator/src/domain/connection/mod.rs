//! Connection Lifecycle Types
//!
//! The state machine every venue client drives, and the shared tracker
//! that exposes a client's current state and counters to readers (the
//! health endpoint, tests) without touching the connection task.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of one venue's persistent connection.
///
/// Transitions, driven by the client's receive loop:
///
/// ```text
/// Connecting -> Subscribing -> Streaming -> Closing -+-> Reconnecting -> Connecting
///                                                    `-> Terminated (after shutdown; sticky)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Opening the WebSocket connection.
    Connecting = 0,
    /// Connection open, subscription request sent, awaiting data.
    Subscribing = 1,
    /// Receiving and decoding frames.
    Streaming = 2,
    /// Connection is going down.
    Closing = 3,
    /// Waiting out the backoff delay before reconnecting.
    Reconnecting = 4,
    /// Shut down permanently; the client never reconnects from here.
    Terminated = 5,
}

impl ConnectionState {
    /// Lowercase name for logs and the health endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Subscribing => "subscribing",
            Self::Streaming => "streaming",
            Self::Closing => "closing",
            Self::Reconnecting => "reconnecting",
            Self::Terminated => "terminated",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Subscribing,
            2 => Self::Streaming,
            3 => Self::Closing,
            4 => Self::Reconnecting,
            5 => Self::Terminated,
            _ => Self::Connecting,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Shared Tracker
// =============================================================================

/// Lock-free view of one venue client's connection lifecycle.
///
/// The owning client is the only writer; readers poll at will.
#[derive(Debug, Default)]
pub struct VenueConnectionState {
    state: AtomicU8,
    frames_received: AtomicU64,
    reconnect_attempts: AtomicU32,
}

impl VenueConnectionState {
    /// Create a tracker in the `Connecting` state with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state transition.
    ///
    /// `Terminated` is sticky: once set, later transitions are ignored
    /// so a cancelled client cannot be resurrected by an in-flight
    /// reconnect path.
    pub fn set_state(&self, state: ConnectionState) {
        let _ = self.state.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            if ConnectionState::from_u8(current) == ConnectionState::Terminated {
                None
            } else {
                Some(state as u8)
            }
        });
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Count one received frame.
    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Total frames received across all connections.
    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    /// Count one reconnection attempt.
    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Total reconnection attempts since startup.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Tests
// =============================================================================
