/// Tokens of the filter-predicate language, e.g. `height<=480 and vcodec!=none`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterToken {
    Ident(String),
    Number(f64),
    String(String),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
}

/// Split a filter body into tokens. Returns `None` on malformed input
/// (unterminated string, stray character) rather than a `Result` because
/// the only thing the caller does with a lex failure is turn it into a
/// `SyntaxErrorKind::MalformedFilter`.
pub fn tokenize(body: &str) -> Option<Vec<FilterToken>> {
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(FilterToken::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(FilterToken::RParen);
            i += 1;
            continue;
        }
        if c == '"' || c == '\'' {
            let quote = c;
            let mut j = i + 1;
            let mut s = String::new();
            while j < chars.len() && chars[j] != quote {
                s.push(chars[j]);
                j += 1;
            }
            if j >= chars.len() {
                return None;
            }
            tokens.push(FilterToken::String(s));
            i = j + 1;
            continue;
        }
        if let Some(op) = match_op(&chars, i) {
            let (token, len) = op;
            tokens.push(token);
            i += len;
            continue;
        }
        if c.is_alphanumeric() || c == '_' || c == '.' || c == '-' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.' || chars[i] == '-')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(classify_word(&word));
            continue;
        }
        return None;
    }

    Some(tokens)
}

fn match_op(chars: &[char], i: usize) -> Option<(FilterToken, usize)> {
    let rest: String = chars[i..].iter().take(2).collect();
    let two = |op: CompareOp| Some((FilterToken::Op(op), 2));
    if rest.starts_with("!=") {
        return two(CompareOp::Ne);
    }
    if rest.starts_with("<=") {
        return two(CompareOp::Le);
    }
    if rest.starts_with(">=") {
        return two(CompareOp::Ge);
    }
    if rest.starts_with("*=") {
        return two(CompareOp::Contains);
    }
    if rest.starts_with("^=") {
        return two(CompareOp::StartsWith);
    }
    if rest.starts_with("$=") {
        return two(CompareOp::EndsWith);
    }
    match chars[i] {
        '=' => Some((FilterToken::Op(CompareOp::Eq), 1)),
        '<' => Some((FilterToken::Op(CompareOp::Lt), 1)),
        '>' => Some((FilterToken::Op(CompareOp::Gt), 1)),
        _ => None,
    }
}

fn classify_word(word: &str) -> FilterToken {
    match word {
        "and" => FilterToken::And,
        "or" => FilterToken::Or,
        "not" => FilterToken::Not,
        _ => match word.parse::<f64>() {
            Ok(n) => FilterToken::Number(n),
            Err(_) => FilterToken::Ident(word.to_string()),
        },
    }
}
