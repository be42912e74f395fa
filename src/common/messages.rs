//! Reply types produced by command dispatch.

/// Discord message length limit.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Something the bot should do in response to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Post text in the channel the command came from.
    Channel(String),
    /// Send text to the invoking user by direct message.
    Direct(String),
    /// Set the invoking user's server nickname.
    Nickname(String),
}

impl Reply {
    /// Text of the reply, whatever its destination.
    pub fn text(&self) -> &str {
        match self {
            Reply::Channel(text) | Reply::Direct(text) | Reply::Nickname(text) => text,
        }
    }
}

/// Largest index `<= index` that lies on a char boundary of `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Split a message into chunks that fit within the max length (in bytes).
///
/// Prefers line breaks, then spaces. Only the separator a split lands on is
/// dropped, so indentation at the start of a chunk survives. Never splits in
/// the middle of a multi-byte UTF-8 character. Blank chunks are skipped.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut push = |chunk: &str| {
        if !chunk.trim().is_empty() {
            chunks.push(chunk.to_string());
        }
    };
    let mut remaining = message;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            push(remaining);
            break;
        }

        let split_at = floor_char_boundary(remaining, max_len);

        // Always make progress, even when max_len is below one character.
        if split_at == 0 {
            let first_char_end = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
            push(&remaining[..first_char_end]);
            remaining = &remaining[first_char_end..];
            continue;
        }

        let chunk = &remaining[..split_at];

        match chunk.rfind('\n').or_else(|| chunk.rfind(' ')) {
            Some(idx) if idx > 0 => {
                push(&remaining[..idx]);
                remaining = &remaining[idx + 1..];
            }
            _ => {
                push(chunk);
                remaining = &remaining[split_at..];
            }
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_text() {
        assert_eq!(Reply::Direct("hi".to_string()).text(), "hi");
        assert_eq!(Reply::Nickname("Alice HP:9/9".to_string()).text(), "Alice HP:9/9");
    }

    #[test]
    fn test_split_message_short() {
        let chunks = split_message("Hello world", 50);
        assert_eq!(chunks, vec!["Hello world"]);
    }

    #[test]
    fn test_split_prefers_newline() {
        let chunks = split_message("first line\nsecond line", 15);
        assert_eq!(chunks, vec!["first line", "second line"]);
    }

    #[test]
    fn test_split_message_on_space() {
        let chunks = split_message("Hello beautiful world", 15);
        assert_eq!(chunks, vec!["Hello", "beautiful world"]);
    }

    #[test]
    fn test_split_keeps_leading_indentation() {
        let chunks = split_message("- first\n  - second", 10);
        assert_eq!(chunks, vec!["- first", "  - second"]);
    }

    #[test]
    fn test_split_skips_blank_chunks() {
        let chunks = split_message("first line\n\n\n", 11);
        assert_eq!(chunks, vec!["first line"]);
    }

    #[test]
    fn test_split_message_no_space() {
        let chunks = split_message("HelloBeautifulWorld", 10);
        assert_eq!(chunks, vec!["HelloBeaut", "ifulWorld"]);
    }

    #[test]
    fn test_split_message_multibyte() {
        // "🎲" is 4 bytes; a limit of 6 lands inside the second one.
        let chunks = split_message("🎲🎲🎲", 6);
        assert_eq!(chunks, vec!["🎲", "🎲", "🎲"]);
    }

    #[test]
    fn test_split_message_respects_limit() {
        let text = "word ".repeat(1000);
        let chunks = split_message(&text, MAX_MESSAGE_LEN);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_MESSAGE_LEN));
    }
}
