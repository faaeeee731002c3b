//! Pure text helpers: character classes, spacing glue, capitalization,
//! prefix diffing, and bounded regex scanning.
//!
//! All positions in this module (and everywhere above it) are
//! char-indexed; byte offsets appear only transiently around `regex`
//! calls.

use regex::Regex;

/// Whitespace that is transparent for spacing decisions.
pub const CHARACTERS_WS: &[char] = &[' ', '\n', '\t'];

/// Symbols that are not preceded by a space in written text.
pub const CHARACTERS_PUNCT: &[char] = &[',', ':', ';', '.', '!', '?', '-', ')'];

/// Symbols after which the next sentence starts. ')' is included
/// because a smiley often ends a sentence.
pub const CHARACTERS_EOS: &[char] = &['.', '!', '?', ')'];

/// Symbols that stick to the following text.
pub const CHARACTERS_STICKY: &[char] = &['(', '[', '{', '<'];

/// Decides whether a space is needed between the left context and the
/// new text. Single letters glue to the previous token (spelling mode).
pub fn glue(text: &str, left_context: &str) -> &'static str {
    let mut chars = text.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return "",
    };
    if first.is_alphabetic() && chars.next().is_none() {
        return "";
    }
    if left_context.is_empty()
        || CHARACTERS_WS.contains(&first)
        || CHARACTERS_PUNCT.contains(&first)
    {
        return "";
    }
    match left_context.chars().last() {
        Some(prev) if CHARACTERS_WS.contains(&prev) || CHARACTERS_STICKY.contains(&prev) => "",
        Some(_) => " ",
        None => "",
    }
}

/// Capitalizes the first letter of `text` when the trimmed left
/// context is empty or ends a sentence.
pub fn capitalize_if_needed(text: &str, left_context: &str) -> String {
    let trimmed = left_context.trim_end();
    let at_sentence_start = trimmed.is_empty()
        || trimmed
            .chars()
            .last()
            .map(|c| CHARACTERS_EOS.contains(&c))
            .unwrap_or(false);
    if !at_sentence_start {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut done = false;
    for c in text.chars() {
        if !done && !CHARACTERS_WS.contains(&c) {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Longest common prefix of two strings, on char boundaries.
pub fn greatest_common_prefix(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

/// Normalizes a raw token stream: spacing and capitalization markers
/// become the real thing.
pub fn pretty_print(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut sentence_start = true;
    for token in text.split_whitespace() {
        let glued = glue(token, &out);
        out.push_str(glued);
        if sentence_start {
            out.push_str(&capitalize_if_needed(token, ""));
        } else {
            out.push_str(token);
        }
        sentence_start = token
            .chars()
            .last()
            .map(|c| CHARACTERS_EOS.contains(&c))
            .unwrap_or(false);
    }
    out
}

/// Case-insensitive search for the last occurrence of `query` in
/// `text`. Returns the char index of the match start and the matched
/// text in its original case.
pub fn last_index_of(query: &str, text: &str) -> Option<(usize, String)> {
    let q: Vec<char> = query.chars().map(lower1).collect();
    let t: Vec<char> = text.chars().map(lower1).collect();
    if q.is_empty() || q.len() > t.len() {
        return None;
    }
    for start in (0..=t.len() - q.len()).rev() {
        if t[start..start + q.len()] == q[..] {
            let matched: String = text.chars().skip(start).take(q.len()).collect();
            return Some((start, matched));
        }
    }
    None
}

fn lower1(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Finds the n-th match of `re` in `input` (n = 0 means the last one),
/// preferring the first capturing group when it participates. The
/// search cursor is forced strictly forward so zero-width matches
/// cannot loop. Returns char-indexed bounds.
pub fn match_nth(re: &Regex, input: &str, n: usize) -> Option<(usize, usize)> {
    let mut found: Option<(usize, usize)> = None;
    let mut cursor = 0usize;
    let mut counter = 0usize;
    while cursor <= input.len() {
        let Some(caps) = re.captures_at(input, cursor) else {
            break;
        };
        let m = match caps.get(1).or_else(|| caps.get(0)) {
            Some(m) => m,
            None => break,
        };
        counter += 1;
        found = Some((m.start(), m.end()));
        if counter == n {
            break;
        }
        if m.end() <= cursor {
            cursor = next_boundary(input, cursor);
        } else {
            cursor = m.end();
        }
    }
    // Fewer than n matches: the last one found wins.
    found.map(|(s, e)| (char_index(input, s), char_index(input, e)))
}

/// Finds a match of `re` in `input` that covers the char range
/// `[start, end)`, preferring the first capturing group. Scanning past
/// `start` without covering it fails.
pub fn match_at_pos(
    re: &Regex,
    input: &str,
    start: usize,
    end: usize,
) -> Option<(usize, usize)> {
    let bstart = byte_index(input, start);
    let bend = byte_index(input, end);
    for caps in re.captures_iter(input) {
        let m = match caps.get(1).or_else(|| caps.get(0)) {
            Some(m) => m,
            None => continue,
        };
        if m.start() <= bstart && bend <= m.end() {
            return Some((char_index(input, m.start()), char_index(input, m.end())));
        }
        if m.start() > bstart {
            return None;
        }
    }
    None
}

/// Byte offset of the char index `idx` in `s`.
pub fn byte_index(s: &str, idx: usize) -> usize {
    s.char_indices()
        .nth(idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// Char index of the byte offset `byte` in `s`.
pub fn char_index(s: &str, byte: usize) -> usize {
    s[..byte].chars().count()
}

fn next_boundary(s: &str, byte: usize) -> usize {
    if byte >= s.len() {
        return s.len() + 1;
    }
    let mut b = byte + 1;
    while b < s.len() && !s.is_char_boundary(b) {
        b += 1;
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_glue_rules() {
        assert_eq!(glue("word", "left"), " ");
        assert_eq!(glue("word", ""), "");
        assert_eq!(glue("word", "left "), "");
        assert_eq!(glue("word", "("), "");
        assert_eq!(glue(", and", "left"), "");
        assert_eq!(glue(".", "left"), "");
        // Single letters are treated as spelling.
        assert_eq!(glue("a", "left"), "");
        assert_eq!(glue("ab", "left"), " ");
    }

    #[test]
    fn test_capitalize_if_needed() {
        assert_eq!(capitalize_if_needed("word", ""), "Word");
        assert_eq!(capitalize_if_needed("word", "Sentence. "), "Word");
        assert_eq!(capitalize_if_needed("word", "Sentence"), "word");
        assert_eq!(capitalize_if_needed("word", "smiley :-) "), "Word");
        assert_eq!(capitalize_if_needed("  word", ""), "  Word");
    }

    #[test]
    fn test_greatest_common_prefix() {
        assert_eq!(greatest_common_prefix("...124", "...1245"), "...124");
        assert_eq!(greatest_common_prefix("abc", "xyz"), "");
        assert_eq!(greatest_common_prefix("", "x"), "");
    }

    #[test]
    fn test_last_index_of_is_case_insensitive() {
        let (idx, matched) = last_index_of("is a", "This is a text").unwrap();
        assert_eq!(idx, 5);
        assert_eq!(matched, "is a");
        let (idx, matched) = last_index_of("this", "This is this").unwrap();
        assert_eq!(idx, 8);
        assert_eq!(matched, "this");
        assert!(last_index_of("missing", "short").is_none());
    }

    #[test]
    fn test_match_nth_counts_forward_and_zero_means_last() {
        let re = Regex::new(r"\d+").unwrap();
        assert_eq!(match_nth(&re, "a1 b22 c333", 1), Some((1, 2)));
        assert_eq!(match_nth(&re, "a1 b22 c333", 2), Some((4, 6)));
        assert_eq!(match_nth(&re, "a1 b22 c333", 0), Some((8, 11)));
        assert_eq!(match_nth(&re, "no digits", 1), None);
    }

    #[test]
    fn test_match_nth_prefers_group_one() {
        let re = Regex::new(r"\[(\w+)\]").unwrap();
        assert_eq!(match_nth(&re, "x [ab] y [cd]", 1), Some((3, 5)));
        assert_eq!(match_nth(&re, "x [ab] y [cd]", 0), Some((10, 12)));
    }

    #[test]
    fn test_match_nth_survives_zero_width_matches() {
        let re = Regex::new(r"\b").unwrap();
        // Must terminate and report the last boundary.
        assert!(match_nth(&re, "two words", 0).is_some());
    }

    #[test]
    fn test_match_at_pos_requires_cover() {
        let re = Regex::new(r"\w+").unwrap();
        // Selection inside the second word.
        assert_eq!(match_at_pos(&re, "one twothree", 5, 8), Some((4, 12)));
        // Selection spanning the gap is covered by nothing.
        assert_eq!(match_at_pos(&re, "one two", 2, 5), None);
    }

    #[test]
    fn test_pretty_print() {
        assert_eq!(pretty_print("hello world . next one"), "Hello world. Next one");
    }

    #[test]
    fn test_char_byte_conversions() {
        let s = "aä̃b";
        assert_eq!(char_index(s, byte_index(s, 2)), 2);
    }
}
