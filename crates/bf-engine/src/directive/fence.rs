//! Code fence tracking.
//!
//! Directive syntax inside fenced code blocks is literal text, so the
//! scanner asks the tracker about every line before looking for directives.

/// An open code fence: its character and opening run length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenFence {
    marker: char,
    len: usize,
}

/// Tracks code fence state during line-by-line scanning.
///
/// Fences use backticks or tildes (three or more). A closing fence uses the
/// same character, is at least as long as the opening one, and carries no
/// info string.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<OpenFence>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed the next line. Returns `true` when the line belongs to a code
    /// block (the fences themselves included) and must not be scanned.
    pub(crate) fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        match self.open {
            Some(fence) => {
                if closes(trimmed, fence) {
                    self.open = None;
                }
                true
            }
            None => match opening_fence(trimmed) {
                Some(fence) => {
                    self.open = Some(fence);
                    true
                }
                None => false,
            },
        }
    }
}

fn run_length(s: &str, c: char) -> usize {
    s.chars().take_while(|&ch| ch == c).count()
}

fn opening_fence(trimmed: &str) -> Option<OpenFence> {
    let marker = trimmed.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = run_length(trimmed, marker);
    // Backtick info strings may not contain backticks.
    if len < 3 || (marker == '`' && trimmed[len..].contains('`')) {
        return None;
    }
    Some(OpenFence { marker, len })
}

fn closes(trimmed: &str, fence: OpenFence) -> bool {
    let len = run_length(trimmed, fence.marker);
    len >= fence.len && trimmed[len * fence.marker.len_utf8()..].trim().is_empty()
}
