use crate::filter::CompiledFilter;

/// `what` restricts a selector to merged (`""`), video (`"v"`), audio
/// (`"a"`), or any (`"*"`) streams; the `v*`/`a*` spellings additionally
/// mean "including the containing-wildcard" per the grammar, but for
/// membership purposes only the presence of `v`/`a`/`*` matters (see
/// `What::allows`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct What(pub String);

impl What {
    pub fn allows(&self, ty: crate::model::FormatType) -> bool {
        use crate::model::FormatType::*;
        match ty {
            Merged => self.0.is_empty() || self.0 == "*",
            Video => self.0.contains('v') || self.0 == "*",
            Audio => self.0.contains('a') || self.0 == "*",
            Storyboards => self.0 == "*",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectorKind {
    FormatId(String),
    SelectAll(What),
    MergeAll(What),
    SelectBest(What, i64, Option<String>),
    MergeBest(What, i64, Option<String>),
    TakeFirst(Vec<Selector>),
    TakeAll(Vec<Selector>),
    Merge(Box<Selector>, Box<Selector>, bool),
}

/// A node of the parsed selector tree plus the filters that apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub kind: SelectorKind,
    pub filters: Vec<CompiledFilter>,
}

impl Selector {
    pub fn new(kind: SelectorKind) -> Self {
        Self {
            kind,
            filters: Vec::new(),
        }
    }
}
