use crate::error::{SelectorError, SyntaxErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    TakeFirst,
    TakeAll,
    MergeOptional,
    Merge,
    GroupStart,
    GroupEnd,
    FilterStart,
    FilterEnd,
    Name(String),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::TakeFirst => "/".to_string(),
            Token::TakeAll => ",".to_string(),
            Token::MergeOptional => "+?".to_string(),
            Token::Merge => "+".to_string(),
            Token::GroupStart => "(".to_string(),
            Token::GroupEnd => ")".to_string(),
            Token::FilterStart => "[".to_string(),
            Token::FilterEnd => "]".to_string(),
            Token::Name(n) => n.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    InsideFilter,
}

/// Splits a selector string into tokens, tracking byte offsets so errors
/// can point a caret at the offending position. Supports one-step
/// pushback (`restore_token`), mirroring the Python original's
/// `TokenIterator`.
pub struct TokenStream {
    spec: String,
    tokens: Vec<(Token, usize)>,
    counter: usize,
}

impl TokenStream {
    pub fn new(spec: &str) -> Self {
        Self {
            spec: spec.to_string(),
            tokens: tokenize(spec),
            counter: 0,
        }
    }

    pub fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.counter).map(|(t, _)| t.clone());
        if t.is_some() {
            self.counter += 1;
        }
        t
    }

    pub fn restore_token(&mut self) {
        if self.counter > 0 {
            self.counter -= 1;
        }
    }

    /// Byte offset of the token last returned by `next`, used for error
    /// carets. -1 (clamped to 0) before the first `next` call.
    pub fn position(&self) -> usize {
        if self.counter == 0 {
            0
        } else {
            self.tokens
                .get(self.counter - 1)
                .map(|(_, pos)| *pos)
                .unwrap_or(self.spec.len())
        }
    }

    pub fn syntax_error(&self, kind: SyntaxErrorKind) -> SelectorError {
        SelectorError::new(self.spec.clone(), self.position(), kind)
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }
}

fn current_token(rest: &str) -> Option<(Token, usize)> {
    const MULTI: &[(&str, fn() -> Token)] = &[
        ("+?", || Token::MergeOptional),
        ("+", || Token::Merge),
    ];
    for (lit, make) in MULTI {
        if rest.starts_with(lit) {
            return Some((make(), lit.len()));
        }
    }
    let single = |c: char| match c {
        '/' => Some(Token::TakeFirst),
        ',' => Some(Token::TakeAll),
        '(' => Some(Token::GroupStart),
        ')' => Some(Token::GroupEnd),
        '[' => Some(Token::FilterStart),
        ']' => Some(Token::FilterEnd),
        _ => None,
    };
    rest.chars().next().and_then(|c| single(c).map(|t| (t, c.len_utf8())))
}

/// Tokenize in two modes: `Normal` recognizes every structural token;
/// `InsideFilter` (entered right after `[`) only recognizes `]`, so a
/// filter body can contain anything except that closing bracket.
fn tokenize(spec: &str) -> Vec<(Token, usize)> {
    let mut tokens = Vec::new();
    let mut mode = Mode::Normal;
    let mut i = 0;

    while i < spec.len() {
        let rest = &spec[i..];

        let recognized = match mode {
            Mode::Normal => current_token(rest),
            Mode::InsideFilter => {
                if rest.starts_with(']') {
                    Some((Token::FilterEnd, 1))
                } else {
                    None
                }
            }
        };

        if let Some((token, len)) = recognized {
            mode = if token == Token::FilterStart {
                Mode::InsideFilter
            } else {
                Mode::Normal
            };
            tokens.push((token, i));
            i += len;
            continue;
        }

        let name_start = i;
        let name_len = match mode {
            Mode::Normal => find_next_token_boundary(rest),
            Mode::InsideFilter => rest.find(']').unwrap_or(rest.len()),
        };
        let raw: &str = &rest[..name_len];
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            tokens.push((Token::Name(trimmed.to_string()), name_start));
        }
        i += name_len;
    }

    tokens
}

/// Find how many bytes of `rest` (starting at its beginning) form a `Name`
/// run, i.e. up to (but not including) the next recognizable structural
/// token.
fn find_next_token_boundary(rest: &str) -> usize {
    let mut best = rest.len();
    for (idx, _) in rest.char_indices() {
        if current_token(&rest[idx..]).is_some() {
            best = idx;
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(spec: &str) -> Vec<Token> {
        TokenStream::new(spec).tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn splits_combinators() {
        assert_eq!(
            names("bv+ba/b"),
            vec![
                Token::Name("bv".to_string()),
                Token::Merge,
                Token::Name("ba".to_string()),
                Token::TakeFirst,
                Token::Name("b".to_string()),
            ]
        );
    }

    #[test]
    fn prefers_merge_optional_over_merge() {
        assert_eq!(
            names("bv+?ba"),
            vec![
                Token::Name("bv".to_string()),
                Token::MergeOptional,
                Token::Name("ba".to_string()),
            ]
        );
    }

    #[test]
    fn filter_body_is_opaque_until_close_bracket() {
        assert_eq!(
            names("best[height<=480]"),
            vec![
                Token::Name("best".to_string()),
                Token::FilterStart,
                Token::Name("height<=480".to_string()),
                Token::FilterEnd,
            ]
        );
    }

    #[test]
    fn pushback_restores_last_token() {
        let mut stream = TokenStream::new("a,b");
        let first = stream.next();
        assert_eq!(first, Some(Token::Name("a".to_string())));
        stream.restore_token();
        assert_eq!(stream.next(), first);
    }
}
