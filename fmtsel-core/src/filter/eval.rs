use std::collections::BTreeMap;

use serde_json::Value;

use super::lexer::CompareOp;
use super::parser::{FilterExpr, FilterValue};
use crate::model::FormatDescriptor;

fn lookup(format: &FormatDescriptor, info_dict: &BTreeMap<String, Value>, field: &str) -> Option<Value> {
    format.field(field).or_else(|| info_dict.get(field).cloned())
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string().trim_matches('"').to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}

/// Evaluate a parsed filter against a descriptor overlaid on an info-dict,
/// descriptor taking precedence on conflicts. Never fails: a numeric
/// comparison against a non-numeric or missing field is simply `false`.
pub fn evaluate(expr: &FilterExpr, format: &FormatDescriptor, info_dict: &BTreeMap<String, Value>) -> bool {
    match expr {
        FilterExpr::And(lhs, rhs) => evaluate(lhs, format, info_dict) && evaluate(rhs, format, info_dict),
        FilterExpr::Or(lhs, rhs) => evaluate(lhs, format, info_dict) || evaluate(rhs, format, info_dict),
        FilterExpr::Not(inner) => !evaluate(inner, format, info_dict),
        FilterExpr::Present(field) => lookup(format, info_dict, field).is_some_and(|v| is_truthy(&v)),
        FilterExpr::Compare { field, op, value } => {
            let Some(actual) = lookup(format, info_dict, field) else {
                return false;
            };
            compare(&actual, *op, value)
        }
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &FilterValue) -> bool {
    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let equal = match expected {
                FilterValue::Number(n) => as_f64(actual).map(|a| a == *n).unwrap_or(false),
                FilterValue::Text(s) => as_text(actual) == *s,
            };
            if op == CompareOp::Eq {
                equal
            } else {
                !equal
            }
        }
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let (Some(a), FilterValue::Number(n)) = (as_f64(actual), expected) else {
                return false;
            };
            match op {
                CompareOp::Lt => a < *n,
                CompareOp::Le => a <= *n,
                CompareOp::Gt => a > *n,
                CompareOp::Ge => a >= *n,
                _ => unreachable!(),
            }
        }
        CompareOp::Contains | CompareOp::StartsWith | CompareOp::EndsWith => {
            let text = as_text(actual);
            let needle = match expected {
                FilterValue::Number(n) => n.to_string(),
                FilterValue::Text(s) => s.clone(),
            };
            match op {
                CompareOp::Contains => text.contains(&needle),
                CompareOp::StartsWith => text.starts_with(&needle),
                CompareOp::EndsWith => text.ends_with(&needle),
                _ => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::parse_filter;

    fn format_with_height(height: u64) -> FormatDescriptor {
        FormatDescriptor {
            height: Some(height),
            ..Default::default()
        }
    }

    #[test]
    fn numeric_comparison_excludes_non_matching() {
        let expr = parse_filter("height<=480").unwrap();
        let info = BTreeMap::new();
        assert!(evaluate(&expr, &format_with_height(480), &info));
        assert!(!evaluate(&expr, &format_with_height(720), &info));
    }

    #[test]
    fn missing_field_never_errors() {
        let expr = parse_filter("tbr>100").unwrap();
        let info = BTreeMap::new();
        assert!(!evaluate(&expr, &FormatDescriptor::default(), &info));
    }

    #[test]
    fn filter_distributivity() {
        let combined = parse_filter("height<=720 and vcodec=h264").unwrap();
        let separate_a = parse_filter("height<=720").unwrap();
        let separate_b = parse_filter("vcodec=h264").unwrap();

        let mut f = format_with_height(480);
        f.vcodec = Some("h264".to_string());
        let info = BTreeMap::new();

        assert_eq!(
            evaluate(&combined, &f, &info),
            evaluate(&separate_a, &f, &info) && evaluate(&separate_b, &f, &info)
        );
    }
}
