//! Per-submission stream accumulator with reasoning-marker rewriting.
//!
//! Reasoning models emit `<think>` ... `</think>` inline with normal content.
//! When detection is on, every occurrence of a marker inside a fragment is
//! replaced with wrapper markup the renderer understands; surrounding text
//! is kept verbatim. A marker split across fragments is recognized by
//! holding back a fragment tail that could still become one.

/// Opening reasoning delimiter emitted by the model.
pub const OPEN_MARKER: &str = "<think>";
/// Closing reasoning delimiter emitted by the model.
pub const CLOSE_MARKER: &str = "</think>";
/// Markup substituted for [`OPEN_MARKER`].
pub const WRAPPER_OPEN: &str = "<div class=\"thinking-box\">";
/// Markup substituted for [`CLOSE_MARKER`].
pub const WRAPPER_CLOSE: &str = "</div>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Open,
    Close,
}

impl Marker {
    fn text(self) -> &'static str {
        match self {
            Marker::Open => OPEN_MARKER,
            Marker::Close => CLOSE_MARKER,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReasoningFilter {
    detect: bool,
    buffer: String,
    pending: String,
    in_reasoning: bool,
}

impl ReasoningFilter {
    /// `detect` enables marker rewriting; without it fragments pass through.
    pub fn new(detect: bool) -> Self {
        Self {
            detect,
            ..Self::default()
        }
    }

    /// Accumulated output so far.
    pub fn content(&self) -> &str {
        &self.buffer
    }

    pub fn into_content(self) -> String {
        self.buffer
    }

    /// Whether the last marker seen opened a reasoning block.
    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    /// Feed one fragment. Returns true if the accumulated output changed.
    pub fn push(&mut self, fragment: &str) -> bool {
        if !self.detect {
            self.buffer.push_str(fragment);
            return !fragment.is_empty();
        }

        let before = self.buffer.len();
        let mut input = std::mem::take(&mut self.pending);
        input.push_str(fragment);

        let mut rest = input.as_str();
        while let Some((at, marker)) = find_marker(rest) {
            self.buffer.push_str(&rest[..at]);
            self.apply(marker);
            rest = &rest[at + marker.text().len()..];
        }

        let held = partial_marker_suffix(rest);
        let split = rest.len() - held;
        self.buffer.push_str(&rest[..split]);
        self.pending = rest[split..].to_string();

        self.buffer.len() != before
    }

    /// End of stream: release any held-back text and close an open block.
    /// Returns true if the accumulated output changed.
    pub fn finish(&mut self) -> bool {
        let before = self.buffer.len();
        let pending = std::mem::take(&mut self.pending);
        self.buffer.push_str(&pending);
        if self.in_reasoning {
            self.buffer.push_str(WRAPPER_CLOSE);
            self.in_reasoning = false;
        }
        self.buffer.len() != before
    }

    fn apply(&mut self, marker: Marker) {
        match (marker, self.in_reasoning) {
            (Marker::Open, false) => {
                self.buffer.push_str(WRAPPER_OPEN);
                self.in_reasoning = true;
            }
            (Marker::Close, true) => {
                self.buffer.push_str(WRAPPER_CLOSE);
                self.in_reasoning = false;
            }
            // Redundant marker: dropped.
            _ => {}
        }
    }
}

/// Earliest marker in `text`, with its byte offset.
fn find_marker(text: &str) -> Option<(usize, Marker)> {
    let open = text.find(OPEN_MARKER).map(|i| (i, Marker::Open));
    let close = text.find(CLOSE_MARKER).map(|i| (i, Marker::Close));
    match (open, close) {
        (Some(o), Some(c)) => Some(if o.0 <= c.0 { o } else { c }),
        (o, c) => o.or(c),
    }
}

/// Length of the longest suffix of `text` that is a strict prefix of a marker.
fn partial_marker_suffix(text: &str) -> usize {
    let longest = CLOSE_MARKER.len().max(OPEN_MARKER.len()) - 1;
    for k in (1..=longest.min(text.len())).rev() {
        let start = text.len() - k;
        if !text.is_char_boundary(start) {
            continue;
        }
        let tail = &text[start..];
        if OPEN_MARKER.starts_with(tail) || CLOSE_MARKER.starts_with(tail) {
            return k;
        }
    }
    0
}
