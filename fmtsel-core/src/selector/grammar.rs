use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SELECTOR_NAME_RE: Regex = Regex::new(
        r"(?x)
        ^
        (?P<merge>merge)?
        (?P<all>all)?
        (?P<which>best|worst|b|w)?
        (?P<what>video|audio|v|a)?
        (?P<containing>\*)?
        (?:\.(?P<n>[1-9]\d*))?
        (?:\{(?P<field>\w+)\})?
        $
        "
    )
    .unwrap();
}

/// Parsed shape of a bare `Name` token against the selector grammar's
/// `SEL` production. `None` means the token didn't fully match the
/// grammar and should be treated as a literal format id instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorName {
    pub merge: bool,
    pub all: bool,
    pub which: Option<String>,
    pub what: String,
    pub containing: bool,
    pub n: Option<i64>,
    pub field: Option<String>,
}

impl SelectorName {
    pub fn parse(token: &str) -> Option<Self> {
        let caps = SELECTOR_NAME_RE.captures(token)?;
        Some(Self {
            merge: caps.name("merge").is_some(),
            all: caps.name("all").is_some(),
            which: caps.name("which").map(|m| m.as_str().to_string()),
            what: caps.name("what").map_or(String::new(), |m| m.as_str().to_string()),
            containing: caps.name("containing").is_some(),
            n: caps.name("n").map(|m| m.as_str().parse().unwrap()),
            field: caps.name("field").map(|m| m.as_str().to_string()),
        })
    }

    /// Combined `v`/`a`/`""` plus an optional trailing `*`, e.g. `"v*"`.
    pub fn what_spec(&self) -> String {
        let mut s = self.what.chars().next().map(String::from).unwrap_or_default();
        if self.containing {
            s.push('*');
        }
        s
    }

    /// Positive = Nth best, negative = Nth worst.
    pub fn idx(&self) -> i64 {
        let n = self.n.unwrap_or(1);
        let worst = self.which.as_deref().map_or(false, |w| w.starts_with('w'));
        if worst {
            -n
        } else {
            n
        }
    }

    /// Mirrors `_SelectorMobj.is_valid`: `all` cannot combine with
    /// `best`/`worst`, `.n`, or `{field}`; without `all` there must be a
    /// `best`/`worst`; and `merge` without `all` requires a `{field}`.
    pub fn is_valid(&self) -> bool {
        let all_with_extras = self.all && (self.field.is_some() || self.which.is_some() || self.n.is_some());
        let neither_all_nor_which = !self.all && self.which.is_none();
        let merge_without_field = !self.all && self.merge && self.field.is_none();
        !(all_with_extras || neither_all_nor_which || merge_without_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_best_video() {
        let n = SelectorName::parse("bv").unwrap();
        assert!(n.is_valid());
        assert_eq!(n.which.as_deref(), Some("b"));
        assert_eq!(n.what_spec(), "v");
        assert_eq!(n.idx(), 1);
    }

    #[test]
    fn parses_worst_with_index_and_field() {
        let n = SelectorName::parse("worst.2{height}").unwrap();
        assert!(n.is_valid());
        assert_eq!(n.idx(), -2);
        assert_eq!(n.field.as_deref(), Some("height"));
    }

    #[test]
    fn all_combined_with_best_is_invalid() {
        let n = SelectorName::parse("allbest").unwrap();
        assert!(!n.is_valid());
    }

    #[test]
    fn merge_without_field_is_invalid_unless_all() {
        let merge_best = SelectorName::parse("mergebest").unwrap();
        assert!(!merge_best.is_valid());

        let merge_all = SelectorName::parse("mergeall").unwrap();
        assert!(merge_all.is_valid());
    }

    #[test]
    fn literal_format_id_does_not_match_grammar() {
        assert!(SelectorName::parse("mp4").is_none());
        assert!(SelectorName::parse("234").is_none());
    }

    #[test]
    fn bare_wildcard_without_all_or_which_is_invalid() {
        let n = SelectorName::parse("*").unwrap();
        assert!(!n.is_valid());
    }
}
