use crate::model::FormatDescriptor;

/// Contract for the external "downloader object" the original spec treats
/// as an out-of-scope collaborator: it owns the runtime parameters the
/// engine reads and the only side-effecting operation the engine ever
/// calls out to (probing whether a format is actually reachable).
pub trait SelectionHost {
    /// Forced output container for merges, e.g. `Some("mkv")`.
    fn merge_output_format(&self) -> Option<String>;
    /// Whether a merge may keep more than one audio stream.
    fn allow_multiple_audio_streams(&self) -> bool;
    /// Whether a merge may keep more than one video stream.
    fn allow_multiple_video_streams(&self) -> bool;
    /// Opt-in: only probe formats that actually got selected, rather than
    /// trusting every candidate in the input list.
    fn check_only_selected_formats(&self) -> bool;
    /// Probe a single elementary format for availability. Only called at
    /// all when `check_only_selected_formats` is true.
    fn check_format(&self, format: &FormatDescriptor) -> bool;
}

/// A host with no I/O: parameters are fixed at construction, and format
/// checking either always succeeds or is driven by an explicit allow-list.
/// Used by the demo CLI (no real probing backend) and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub merge_output_format: Option<String>,
    pub allow_multiple_audio_streams: bool,
    pub allow_multiple_video_streams: bool,
    /// `None` means "don't check"; `Some(ids)` means only `format_id`s in
    /// `ids` are considered reachable.
    pub reachable_format_ids: Option<Vec<String>>,
}

impl SelectionHost for StaticHost {
    fn merge_output_format(&self) -> Option<String> {
        self.merge_output_format.clone()
    }

    fn allow_multiple_audio_streams(&self) -> bool {
        self.allow_multiple_audio_streams
    }

    fn allow_multiple_video_streams(&self) -> bool {
        self.allow_multiple_video_streams
    }

    fn check_only_selected_formats(&self) -> bool {
        self.reachable_format_ids.is_some()
    }

    fn check_format(&self, format: &FormatDescriptor) -> bool {
        match &self.reachable_format_ids {
            None => true,
            Some(ids) => format
                .format_id
                .as_deref()
                .map_or(false, |id| ids.iter().any(|allowed| allowed == id)),
        }
    }
}
