use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel the original uses for "this codec slot is absent".
const NONE_CODEC: &str = "none";

/// An opaque descriptor for one downloadable stream.
///
/// Every field the engine cares about is named explicitly; attributes
/// the filter language may still want to reach (custom extractor
/// metadata) live in `extra` instead of reopening the struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub tbr: Option<f64>,
    pub vbr: Option<f64>,
    pub abr: Option<f64>,
    pub asr: Option<f64>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub fps: Option<f64>,
    pub resolution: Option<String>,
    pub dynamic_range: Option<String>,
    pub stretched_ratio: Option<f64>,
    pub language: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    pub protocol: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub requested_formats: Option<Vec<FormatDescriptor>>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

impl FormatDescriptor {
    /// Look up a field by name, descriptor first, falling back to `None`.
    /// Used by the filter evaluator, which overlays this onto `info_dict`.
    pub fn field(&self, name: &str) -> Option<Value> {
        macro_rules! num {
            ($v:expr) => {
                $v.map(|n| Value::from(n))
            };
        }
        match name {
            "format_id" => self.format_id.clone().map(Value::from),
            "format" => self.format.clone().map(Value::from),
            "ext" => self.ext.clone().map(Value::from),
            "vcodec" => self.vcodec.clone().map(Value::from),
            "acodec" => self.acodec.clone().map(Value::from),
            "tbr" => num!(self.tbr),
            "vbr" => num!(self.vbr),
            "abr" => num!(self.abr),
            "asr" => num!(self.asr),
            "width" => num!(self.width),
            "height" => num!(self.height),
            "fps" => num!(self.fps),
            "resolution" => self.resolution.clone().map(Value::from),
            "dynamic_range" => self.dynamic_range.clone().map(Value::from),
            "stretched_ratio" => num!(self.stretched_ratio),
            "language" => self.language.clone().map(Value::from),
            "format_note" => self.format_note.clone().map(Value::from),
            "filesize" => num!(self.filesize),
            "filesize_approx" => num!(self.filesize_approx),
            "protocol" => self.protocol.clone().map(Value::from),
            "url" => self.url.clone().map(Value::from),
            _ => self.extra.get(name).cloned(),
        }
    }

    fn codec_is_none(codec: &Option<String>) -> bool {
        match codec.as_deref() {
            Some(c) => c == NONE_CODEC,
            None => true,
        }
    }

    pub fn classify(&self) -> FormatType {
        let video_absent = Self::codec_is_none(&self.vcodec);
        let audio_absent = Self::codec_is_none(&self.acodec);
        match (video_absent, audio_absent) {
            (true, true) => FormatType::Storyboards,
            (true, false) => FormatType::Audio,
            (false, true) => FormatType::Video,
            (false, false) => FormatType::Merged,
        }
    }
}

/// The four-valued classification derived from `(vcodec, acodec)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    Video,
    Audio,
    Merged,
    Storyboards,
}

impl FormatType {
    pub fn of(format: &FormatDescriptor) -> FormatType {
        format.classify()
    }

    /// `self` matches `format` directly, or `format` is `Merged` and
    /// `self` is not `Storyboards` (a merged stream satisfies both an
    /// audio-only and a video-only request).
    pub fn isin(self, format: &FormatDescriptor) -> bool {
        let actual = Self::of(format);
        actual == self || (actual == FormatType::Merged && self != FormatType::Storyboards)
    }
}

/// `format_resolution` from the distilled spec: a human label for a
/// format's video resolution, or `"audio only"` for audio streams.
pub fn format_resolution(format: &FormatDescriptor, default: &str) -> String {
    if FormatType::of(format) == FormatType::Audio {
        return "audio only".to_string();
    }
    if let Some(resolution) = &format.resolution {
        return resolution.clone();
    }
    match (format.width, format.height) {
        (Some(w), Some(h)) => format!("{w}x{h}"),
        (None, Some(h)) => format!("{h}p"),
        (Some(w), None) => format!("{w}x?"),
        (None, None) => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(vcodec: Option<&str>, acodec: Option<&str>) -> FormatDescriptor {
        FormatDescriptor {
            vcodec: vcodec.map(String::from),
            acodec: acodec.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn classification_totality() {
        let cases = [
            (Some("none"), Some("none"), FormatType::Storyboards),
            (None, None, FormatType::Storyboards),
            (Some("none"), Some("aac"), FormatType::Audio),
            (Some("h264"), Some("none"), FormatType::Video),
            (Some("h264"), Some("aac"), FormatType::Merged),
        ];
        for (v, a, expected) in cases {
            assert_eq!(fmt(v, a).classify(), expected);
        }
    }

    #[test]
    fn merged_satisfies_audio_and_video_isin() {
        let merged = fmt(Some("h264"), Some("aac"));
        assert!(FormatType::Audio.isin(&merged));
        assert!(FormatType::Video.isin(&merged));
        assert!(!FormatType::Storyboards.isin(&merged));
    }

    #[test]
    fn resolution_fallback_chain() {
        let audio = fmt(Some("none"), Some("aac"));
        assert_eq!(format_resolution(&audio, "unknown"), "audio only");

        let mut video = fmt(Some("h264"), Some("none"));
        video.width = Some(1920);
        video.height = Some(1080);
        assert_eq!(format_resolution(&video, "unknown"), "1920x1080");

        video.width = None;
        assert_eq!(format_resolution(&video, "unknown"), "1080p");

        video.height = None;
        video.width = Some(1920);
        assert_eq!(format_resolution(&video, "unknown"), "1920x?");

        video.width = None;
        assert_eq!(format_resolution(&video, "unknown"), "unknown");
    }
}
