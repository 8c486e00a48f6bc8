// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply splitting for platforms with a maximum message length.

/// Splits `text` into chunks of at most `max_len` characters.
///
/// Prefers to break at the last newline within the window, then at the
/// last whitespace, and hard-cuts only when a single unbroken run
/// exceeds the cap. Chunks are trimmed; empty chunks are dropped.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let text = text.trim();
    if max_len == 0 || text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();

    while rest.len() > max_len {
        let window = &rest[..max_len];
        let cut = window
            .iter()
            .rposition(|c| *c == '\n')
            .or_else(|| window.iter().rposition(|c| c.is_whitespace()))
            // One unbroken run longer than the cap: hard cut.
            .map_or(max_len, |pos| pos + 1);

        let chunk: String = rest[..cut].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        rest.drain(..cut);
    }

    let tail: String = rest.into_iter().collect();
    let tail = tail.trim();
    if !tail.is_empty() {
        chunks.push(tail.to_string());
    }
    chunks
}
