//! Minimal lexical helpers over SQL text.
//!
//! Not a parser: they only track string literals, quoted identifiers and
//! parenthesis depth well enough to split lists, spot top-level keywords and
//! find the parenthesized group around a position.

use std::ops::Range;

/// Split `sql` on `separator` occurring outside quotes and parentheses.
/// Empty pieces are dropped.
pub fn split_top_level(sql: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for (_, c, depth, quoted) in scan(sql) {
        if c == separator && depth == 0 && !quoted {
            push_trimmed(&mut parts, &current);
            current.clear();
        } else {
            current.push(c);
        }
    }
    push_trimmed(&mut parts, &current);
    parts
}

/// Whether `keyword` (single word, case-insensitive) appears outside quotes
/// and parentheses.
pub fn has_top_level_keyword(sql: &str, keyword: &str) -> bool {
    find_top_level_keyword(sql, keyword).is_some()
}

/// Byte range of the first occurrence of `keyword` outside quotes and
/// parentheses.
pub fn find_top_level_keyword(sql: &str, keyword: &str) -> Option<Range<usize>> {
    let keyword = keyword.to_ascii_uppercase();
    let mut word = String::new();
    let mut start = 0;
    for (i, c, depth, quoted) in scan(sql) {
        if depth == 0 && !quoted && (c.is_ascii_alphanumeric() || c == '_') {
            if word.is_empty() {
                start = i;
            }
            word.push(c.to_ascii_uppercase());
            continue;
        }
        if word == keyword {
            return Some(start..i);
        }
        word.clear();
    }
    (word == keyword).then_some(start..sql.len())
}

/// Byte range of the contents of the innermost parenthesized group holding
/// byte offset `at`. The whole text when `at` is at top level.
pub fn enclosing_group(sql: &str, at: usize) -> Range<usize> {
    let mut open = Vec::new();
    let mut nested = 0usize;
    for (i, c, _, quoted) in scan(sql) {
        if quoted {
            continue;
        }
        match c {
            '(' if i < at => open.push(i + 1),
            ')' if i < at => {
                open.pop();
            }
            '(' => nested += 1,
            ')' if nested > 0 => nested -= 1,
            ')' => {
                if let Some(&start) = open.last() {
                    return start..i;
                }
            }
            _ => {}
        }
    }
    open.last().copied().unwrap_or(0)..sql.len()
}

/// `sql` with the contents of single-quoted string literals blanked out.
/// Quoted identifiers are kept.
pub fn mask_string_literals(sql: &str) -> String {
    let mut quote: Option<char> = None;
    sql.chars()
        .map(|c| {
            let in_literal = match quote {
                Some(q) => {
                    if c == q {
                        quote = None;
                    }
                    q == '\''
                }
                None => {
                    if matches!(c, '\'' | '"' | '`') {
                        quote = Some(c);
                    }
                    c == '\''
                }
            };
            if in_literal && c != '\'' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

fn push_trimmed(parts: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        parts.push(piece.to_string());
    }
}

/// Yields each char with its byte offset, the parenthesis depth and whether
/// it sits inside a quoted section (the quote characters themselves count as
/// quoted).
fn scan(sql: &str) -> impl Iterator<Item = (usize, char, usize, bool)> + '_ {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    sql.char_indices().map(move |(i, c)| {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            return (i, c, depth, true);
        }
        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                (i, c, depth, true)
            }
            '(' => {
                depth += 1;
                (i, c, depth - 1, false)
            }
            ')' => {
                depth = depth.saturating_sub(1);
                (i, c, depth, false)
            }
            _ => (i, c, depth, false),
        }
    })
}
