use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::model::FormatDescriptor;

/// Per-evaluation immutable configuration bundle.
///
/// Cheaply `Clone`-able (the callback and info-dict are reference
/// counted) because every selector variant that recurses into children
/// passes a fresh copy down rather than threading a borrow through the
/// whole tree. Nothing here is ever mutated after construction; any
/// caching `check_format` needs (see `build_format_selector`) lives in
/// the closure's own captured state, not in this struct.
#[derive(Clone)]
pub struct EvalContext {
    pub merge_output_format: Option<String>,
    pub allow_multiple_audio_streams: bool,
    pub allow_multiple_video_streams: bool,
    pub has_merged_format: bool,
    pub incomplete_formats: bool,
    pub info_dict: Rc<BTreeMap<String, Value>>,
    check_format: Rc<dyn Fn(&FormatDescriptor) -> bool>,
}

impl EvalContext {
    pub fn new(
        merge_output_format: Option<String>,
        allow_multiple_audio_streams: bool,
        allow_multiple_video_streams: bool,
        formats: &[FormatDescriptor],
        info_dict: Rc<BTreeMap<String, Value>>,
        check_format: Rc<dyn Fn(&FormatDescriptor) -> bool>,
    ) -> Self {
        use crate::model::FormatType;

        let has_merged_format = formats
            .iter()
            .any(|f| FormatType::of(f) == FormatType::Merged);
        let incomplete_formats = [FormatType::Video, FormatType::Audio]
            .into_iter()
            .any(|t| !formats.iter().any(|f| t.isin(f)));

        Self {
            merge_output_format,
            allow_multiple_audio_streams,
            allow_multiple_video_streams,
            has_merged_format,
            incomplete_formats,
            info_dict,
            check_format,
        }
    }

    pub fn check_format(&self, format: &FormatDescriptor) -> bool {
        (self.check_format)(format)
    }

    #[cfg(test)]
    pub fn for_tests(formats: &[FormatDescriptor]) -> Self {
        Self::new(
            None,
            false,
            false,
            formats,
            Rc::new(BTreeMap::new()),
            Rc::new(|_| true),
        )
    }
}
