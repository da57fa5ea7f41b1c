//! Discord message size helpers
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Split on line boundaries and never inside a UTF-8 character
//! - 1.0.0: Initial chunking helpers

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Split text into pieces no longer than `max_size` bytes
///
/// Splits between lines where possible and never inside a UTF-8 character.
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let needed = line.len() + usize::from(!current.is_empty());
        if current.len() + needed > max_size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if line.len() > max_size {
            for ch in line.chars() {
                if current.len() + ch.len_utf8() > max_size {
                    chunks.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Chunk text for message content (2000 byte limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Shorten text to at most `max_chars` characters, ending with an ellipsis
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
