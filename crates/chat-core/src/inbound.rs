//! Append-only log of received payloads.
//!
//! Payloads are stored once, inside the display projection (every entry
//! followed by [`LINE_SEPARATOR`]), together with the byte offset where each
//! entry's line ends. Both grow in the same step, so a reader never observes a
//! partially applied entry, and any earlier projection is a prefix of every
//! later one.

/// Separator written after each entry in the projection.
pub const LINE_SEPARATOR: char = '\n';

/// Ordered, append-only record of inbound message text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundLog {
    transcript: String,
    /// End of each entry's line in `transcript`, separator included.
    ends: Vec<usize>,
}

impl InboundLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload verbatim.
    ///
    /// Crate-private: the session's message-received handler is the only
    /// mutation path.
    pub(crate) fn append(&mut self, payload: &str) {
        self.transcript.push_str(payload);
        self.transcript.push(LINE_SEPARATOR);
        self.ends.push(self.transcript.len());
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Whether nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Monotonic change counter. Increases by one per append.
    pub fn version(&self) -> u64 {
        self.ends.len() as u64
    }

    /// Whether anything was appended after `version` was observed.
    pub fn changed_since(&self, version: u64) -> bool {
        self.version() > version
    }

    /// The entry at `index`, without its separator.
    pub fn entry(&self, index: usize) -> Option<&str> {
        let end = *self.ends.get(index)? - LINE_SEPARATOR.len_utf8();
        Some(&self.transcript[self.line_start(index)..end])
    }

    /// Entries appended after `version` was observed, oldest first.
    ///
    /// A version from the future (larger than the current one) yields nothing.
    pub fn entries_since(&self, version: u64) -> impl Iterator<Item = &str> + '_ {
        (self.first_unseen(version)..self.len()).filter_map(|index| self.entry(index))
    }

    /// The display projection: each entry followed by a line separator.
    pub fn render(&self) -> &str {
        &self.transcript
    }

    /// The part of the projection appended after `version` was observed.
    pub fn render_since(&self, version: u64) -> &str {
        &self.transcript[self.line_start(self.first_unseen(version))..]
    }

    fn first_unseen(&self, version: u64) -> usize {
        usize::try_from(version)
            .unwrap_or(usize::MAX)
            .min(self.len())
    }

    fn line_start(&self, index: usize) -> usize {
        index
            .checked_sub(1)
            .and_then(|prev| self.ends.get(prev).copied())
            .unwrap_or(0)
    }
}
