use super::placeholder::{Protected, is_placeholder, split_around_placeholders};
use crate::directive::Token;
use crate::directive::grammar::SEGMENT_DELIMITER;

fn is_terminal(ch: char) -> bool {
    matches!(ch, '。' | '！' | '？' | '!' | '?')
}

fn is_closer(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '”' | '’' | '」' | '』' | '）' | ')' | '】')
}

/// ASCII `?`/`!` followed by these is part of a URL or query, not a sentence end.
fn continues_token(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '=' | '&' | '/' | '%' | '_' | '-')
}

/// Split after terminal punctuation or a newline. A run of terminal marks
/// and closing quotes stays with its sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == '\n' {
            parts.push(&text[start..idx]);
            start = idx + ch.len_utf8();
            continue;
        }
        if !is_terminal(ch) {
            continue;
        }
        if ch.is_ascii()
            && let Some((_, next)) = chars.peek().copied()
            && continues_token(next)
        {
            continue;
        }

        let mut end = idx + ch.len_utf8();
        while let Some((next_idx, next)) = chars.peek().copied() {
            if is_terminal(next) || is_closer(next) {
                end = next_idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        parts.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        parts.push(&text[start..]);
    }

    parts
}

/// Rewrite a trailing comma/semicolon into a full stop of the same width.
fn close_soft_ending(segment: &str) -> String {
    let mut out = segment.to_string();
    let replacement = match out.chars().last() {
        Some('，' | '；' | '、') => '。',
        Some(',' | ';') => '.',
        _ => return out,
    };
    out.pop();
    out.push(replacement);
    out
}

/// Segment a token stream into sentence-level pieces.
///
/// Directives are protected by placeholders, so each comes back as its own
/// token and punctuation inside them never causes a split. Every returned
/// `Token::Text` is one trimmed, non-empty sentence.
pub fn segment_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut protected = Protected::new(tokens);
    let text = std::mem::take(&mut protected.text);

    let segments: Vec<&str> = if text.contains(SEGMENT_DELIMITER) {
        text.split(SEGMENT_DELIMITER).collect()
    } else {
        split_sentences(&text)
    };

    let mut out = Vec::new();
    for segment in segments {
        for piece in split_around_placeholders(segment) {
            if is_placeholder(piece) {
                if let Some(directive) = protected.restore(piece) {
                    out.push(Token::Directive(directive));
                }
                continue;
            }
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                out.push(Token::Text(close_soft_ending(trimmed)));
            }
        }
    }
    out
}

/// Segment plain text. Convenience over [`segment_tokens`].
pub fn segment_text(text: &str) -> Vec<String> {
    segment_tokens(vec![Token::Text(text.to_string())])
        .into_iter()
        .filter_map(|token| match token {
            Token::Text(text) => Some(text),
            Token::Directive(_) => None,
        })
        .collect()
}
