//! Outbound gate: the pending-input slot and its send admission rule.

use crate::state::SessionState;

/// Result of a send request.
///
/// Only [`SendOutcome::Sent`] clears the pending slot. The other variants are
/// silent no-ops from the session's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// The pending text was handed to the transport and the slot cleared.
    Sent,
    /// The session is not `Open`.
    NotOpen,
    /// The pending text is empty after trimming whitespace.
    Blank,
    /// The transport refused the frame (connection already going away).
    Rejected,
}

/// Holder of not-yet-sent user text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutboundGate {
    pending: String,
}

impl OutboundGate {
    /// Create a gate with an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending text unconditionally. No validation happens here.
    pub fn set_pending(&mut self, text: impl Into<String>) {
        self.pending = text.into();
    }

    /// The pending text, untrimmed.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Decide whether the pending text may be sent while in `state`.
    ///
    /// Returns the exact text to transmit (untrimmed) on admission.
    pub fn admit(&self, state: SessionState) -> Result<&str, SendOutcome> {
        if state != SessionState::Open {
            return Err(SendOutcome::NotOpen);
        }
        if self.pending.trim().is_empty() {
            return Err(SendOutcome::Blank);
        }
        Ok(&self.pending)
    }

    /// Empty the slot after a successful transmission.
    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn set_pending_replaces() {
        let mut gate = OutboundGate::new();
        gate.set_pending("first");
        gate.set_pending("second");
        assert_eq!(gate.pending(), "second");
    }

    #[test]
    fn admit_requires_open() {
        let mut gate = OutboundGate::new();
        gate.set_pending("hello");
        for state in [
            SessionState::Idle,
            SessionState::Connecting,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            assert_matches!(gate.admit(state), Err(SendOutcome::NotOpen));
        }
    }

    #[test]
    fn admit_rejects_blank() {
        let mut gate = OutboundGate::new();
        for text in ["", "   ", "\t\n "] {
            gate.set_pending(text);
            assert_matches!(gate.admit(SessionState::Open), Err(SendOutcome::Blank));
            assert_eq!(gate.pending(), text);
        }
    }

    #[test]
    fn admit_returns_untrimmed_text() {
        let mut gate = OutboundGate::new();
        gate.set_pending("  hi there  ");
        assert_matches!(gate.admit(SessionState::Open), Ok("  hi there  "));
    }

    #[test]
    fn not_open_wins_over_blank() {
        let gate = OutboundGate::new();
        assert_matches!(gate.admit(SessionState::Closed), Err(SendOutcome::NotOpen));
    }
}
