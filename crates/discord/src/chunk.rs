//! Splitting long replies into Discord-sized messages.

/// Discord rejects messages longer than 2 000 characters.
pub const DISCORD_MAX_MESSAGE_LEN: usize = 2000;

/// Split `text` into chunks that fit within `limit`.
///
/// Prefers breaking at the last newline inside the window, unless that
/// newline sits in the first half of the window (a break there would leave
/// a stub chunk), in which case the text is cut hard at the limit. Leading
/// newlines are stripped off the remainder after each split, so rejoining
/// the chunks does not exactly reproduce the input.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= limit {
            chunks.push(remaining.to_string());
            break;
        }

        let window_end = remaining.floor_char_boundary(limit);
        let window = &remaining[..window_end];

        let split_at = match window.rfind('\n') {
            Some(pos) if pos >= limit / 2 => pos,
            _ => window_end,
        };
        // Guard against zero-length chunks when the window starts with the
        // only viable split point.
        let split_at = if split_at == 0 { window_end } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches('\n');
    }

    chunks
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_message("hello", 2000), vec!["hello"]);
    }

    #[test]
    fn text_at_exactly_the_limit_is_a_single_chunk() {
        let text = "a".repeat(2000);
        assert_eq!(chunk_message(&text, 2000), vec![text]);
    }

    #[test]
    fn empty_text_is_a_single_empty_chunk() {
        assert_eq!(chunk_message("", 2000), vec![""]);
    }

    #[test]
    fn long_text_without_newlines_is_hard_cut() {
        let text = "a".repeat(4500);
        let chunks = chunk_message(&text, 2000);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 2000);
        assert_eq!(chunks[1].len(), 2000);
        assert_eq!(chunks[2].len(), 500);
    }

    #[test]
    fn splits_at_the_last_newline_in_the_window() {
        let text = format!("{}\n{}", "a".repeat(1500), "b".repeat(1000));
        let chunks = chunk_message(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(1500));
        assert_eq!(chunks[1], "b".repeat(1000));
    }

    #[test]
    fn newline_in_first_half_of_window_is_ignored() {
        // The only newline sits before limit/2; chunk hard at the limit
        // instead of emitting a stub first chunk.
        let text = format!("{}\n{}", "a".repeat(100), "b".repeat(3000));
        let chunks = chunk_message(&text, 2000);
        assert_eq!(chunks[0].len(), 2000);
        assert!(chunks.iter().all(|c| c.len() <= 2000));
    }

    #[test]
    fn every_chunk_respects_the_limit() {
        let text = "line one is fairly short\n".repeat(500);
        let chunks = chunk_message(&text, 2000);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 2000));
    }

    #[test]
    fn chunk_count_is_bounded() {
        // Every chunk but the last is at least limit/2 long, so the chunk
        // count never exceeds ceil(len / (limit / 2)).
        let text = "word ".repeat(3000);
        let limit = 2000;
        let chunks = chunk_message(&text, limit);
        let bound = text.len().div_ceil(limit / 2);
        assert!(chunks.len() <= bound);
    }

    #[test]
    fn leading_newlines_are_stripped_from_the_remainder() {
        let text = format!("{}\n\n\n{}", "a".repeat(1900), "b".repeat(500));
        let chunks = chunk_message(&text, 2000);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with('b'));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "é".repeat(1500); // 3000 bytes
        let chunks = chunk_message(&text, 2000);
        assert!(chunks.iter().all(|c| c.len() <= 2000));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn zero_limit_returns_nothing() {
        assert!(chunk_message("anything", 0).is_empty());
    }
}
