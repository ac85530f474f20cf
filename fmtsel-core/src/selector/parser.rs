use crate::error::{Result, SyntaxErrorKind};
use crate::filter::CompiledFilter;

use super::grammar::SelectorName;
use super::node::{Selector, SelectorKind, What};
use super::token::{Token, TokenStream};

#[derive(Debug, Clone, Copy, Default)]
struct Mode {
    inside_merge_formats: bool,
    inside_choice: bool,
    inside_group: bool,
}

/// Parse an entire selector string into a tree, or `None` for an empty
/// spec (an empty selector is meaningful at the top level but never valid
/// as a combinator operand, which `parse_tokens` enforces on its own).
pub fn parse(spec: &str) -> Result<Option<Selector>> {
    let mut tokens = TokenStream::new(spec);
    parse_tokens(&mut tokens, Mode::default())
}

fn parse_tokens(tokens: &mut TokenStream, mode: Mode) -> Result<Option<Selector>> {
    let mut last_selector: Option<Selector> = None;
    let mut current_selector: Option<Selector> = None;

    while let Some(token) = tokens.next() {
        match token {
            Token::FilterEnd => {
                return Err(tokens.syntax_error(SyntaxErrorKind::UnexpectedToken(token.describe())));
            }
            Token::GroupEnd => {
                if !mode.inside_group {
                    tokens.restore_token();
                }
                break;
            }
            Token::TakeFirst | Token::TakeAll if mode.inside_merge_formats => {
                tokens.restore_token();
                break;
            }
            Token::TakeAll if mode.inside_choice => {
                tokens.restore_token();
                break;
            }
            Token::TakeAll => {
                let Some(current) = current_selector.take() else {
                    return Err(tokens.syntax_error(SyntaxErrorKind::MissingLeftOperand(token.describe())));
                };
                last_selector = Some(match last_selector.take() {
                    Some(last) => Selector::new(SelectorKind::TakeAll(vec![last, current])),
                    None => current,
                });
            }
            Token::TakeFirst => {
                let Some(current) = current_selector.take() else {
                    return Err(tokens.syntax_error(SyntaxErrorKind::MissingLeftOperand(token.describe())));
                };
                let choice_mode = Mode {
                    inside_choice: true,
                    ..Mode::default()
                };
                let rhs = parse_tokens(tokens, choice_mode)?;
                let mut children = vec![current];
                if let Some(rhs) = rhs {
                    children.push(rhs);
                }
                current_selector = Some(Selector::new(SelectorKind::TakeFirst(children)));
            }
            Token::FilterStart => {
                let position = tokens.position();
                let body_token = tokens.next();
                let body = match body_token {
                    Some(Token::Name(body)) => body,
                    _ => return Err(tokens.syntax_error(SyntaxErrorKind::MalformedFilter)),
                };
                let filter = CompiledFilter::compile(&body, tokens.spec(), position)?;
                if !matches!(tokens.next(), Some(Token::FilterEnd)) {
                    return Err(tokens.syntax_error(SyntaxErrorKind::FilterNotClosed));
                }
                let selector = current_selector.get_or_insert_with(|| {
                    Selector::new(SelectorKind::SelectBest(What::default(), 1, None))
                });
                selector.filters.push(filter);
            }
            Token::GroupStart => {
                if current_selector.is_some() {
                    return Err(tokens.syntax_error(SyntaxErrorKind::UnexpectedToken(token.describe())));
                }
                let group_mode = Mode {
                    inside_group: true,
                    ..Mode::default()
                };
                current_selector = parse_tokens(tokens, group_mode)?;
            }
            Token::Merge | Token::MergeOptional => {
                let Some(current) = current_selector.take() else {
                    return Err(tokens.syntax_error(SyntaxErrorKind::MissingLeftOperand(token.describe())));
                };
                let merge_mode = Mode {
                    inside_merge_formats: true,
                    ..Mode::default()
                };
                let rhs = parse_tokens(tokens, merge_mode)?;
                let Some(rhs) = rhs else {
                    return Err(tokens.syntax_error(SyntaxErrorKind::MissingRightOperand(token.describe())));
                };
                let optional = token == Token::MergeOptional;
                current_selector = Some(Selector::new(SelectorKind::Merge(
                    Box::new(current),
                    Box::new(rhs),
                    optional,
                )));
            }
            Token::Name(name) => {
                current_selector = Some(parse_name(tokens, &name)?);
            }
        }
    }

    Ok(match (last_selector, current_selector) {
        (Some(last), Some(current)) => Some(Selector::new(SelectorKind::TakeAll(vec![last, current]))),
        (Some(last), None) => Some(last),
        (None, current) => current,
    })
}

fn parse_name(tokens: &TokenStream, name: &str) -> Result<Selector> {
    let Some(parsed) = SelectorName::parse(name) else {
        return Ok(Selector::new(SelectorKind::FormatId(name.to_string())));
    };
    if !parsed.is_valid() {
        return Err(tokens.syntax_error(SyntaxErrorKind::InvalidSelectorToken(name.to_string())));
    }

    let what = What(parsed.what_spec());
    let kind = if parsed.which.is_some() {
        let field = parsed.field.clone();
        if parsed.merge {
            SelectorKind::MergeBest(what, parsed.idx(), field)
        } else {
            SelectorKind::SelectBest(what, parsed.idx(), field)
        }
    } else if parsed.merge {
        SelectorKind::MergeAll(what)
    } else {
        SelectorKind::SelectAll(what)
    };
    Ok(Selector::new(kind))
}
