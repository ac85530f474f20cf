//! Format-selector evaluation engine: parses a yt-dlp-style selector
//! string (`bestvideo+bestaudio/best`, `b[height<=1080]`, ...) and applies
//! it to a list of format descriptors, merging and filtering as the
//! selector requires.

pub mod context;
pub mod error;
pub mod filter;
pub mod host;
pub mod merge;
pub mod model;
pub mod selector;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde_json::Value;

pub use context::EvalContext;
pub use error::{Result, SelectorError, SyntaxErrorKind};
pub use host::{SelectionHost, StaticHost};
pub use merge::{decompose_formats, merge_formats};
pub use model::{format_resolution, FormatDescriptor, FormatType};
pub use selector::{Selector, SelectorKind, What};

use selector::SelectorKind as Kind;

/// Parse `spec` once and return a closure that applies it to a format list.
///
/// Mirrors the distilled driver's `build_format_selector`: parsing happens
/// a single time up front, and `host.check_format` results are memoized
/// by `format_id` across every call to the returned closure, so repeated
/// invocations against the same probing backend don't re-probe formats
/// they've already resolved.
pub fn build_format_selector<H>(
    spec: &str,
    host: Rc<H>,
) -> Result<impl Fn(&[FormatDescriptor], Rc<BTreeMap<String, Value>>) -> Vec<FormatDescriptor>>
where
    H: SelectionHost + 'static,
{
    let tree = selector::parse(spec)?.unwrap_or_else(default_selector);
    log::debug!("parsed format selector {spec:?} into {tree:?}");
    let cache: Rc<RefCell<HashMap<String, bool>>> = Rc::new(RefCell::new(HashMap::new()));

    Ok(move |formats: &[FormatDescriptor], info_dict: Rc<BTreeMap<String, Value>>| {
        let merge_output_format = host.merge_output_format();
        let allow_multiple_audio_streams = host.allow_multiple_audio_streams();
        let allow_multiple_video_streams = host.allow_multiple_video_streams();
        let check_only_selected = host.check_only_selected_formats();

        let host_for_check = Rc::clone(&host);
        let cache_for_check = Rc::clone(&cache);
        let check_format: Rc<dyn Fn(&FormatDescriptor) -> bool> = Rc::new(move |f: &FormatDescriptor| {
            if !check_only_selected {
                return true;
            }
            merge::elementary_parts(std::slice::from_ref(f)).iter().all(|part| {
                let key = part.format_id.clone().unwrap_or_default();
                if let Some(cached) = cache_for_check.borrow().get(&key) {
                    return *cached;
                }
                let result = host_for_check.check_format(part);
                cache_for_check.borrow_mut().insert(key, result);
                result
            })
        });

        let ctx = EvalContext::new(
            merge_output_format,
            allow_multiple_audio_streams,
            allow_multiple_video_streams,
            formats,
            info_dict,
            check_format,
        );
        selector::apply(&tree, formats, &ctx)
    })
}

/// The selector an empty spec (or a spec consisting only of filters) is
/// treated as: `best`.
fn default_selector() -> Selector {
    Selector::new(Kind::SelectBest(What::default(), 1, None))
}

/// Package version plus the short git hash and build date baked in by
/// `build.rs`, for the CLI's `--version` output.
pub fn engine_version() -> String {
    let package_version = env!("CARGO_PKG_VERSION");
    let git_hash = env!("GIT_HASH");
    let build_date = env!("BUILD_DATE");
    if git_hash.is_empty() {
        package_version.to_string()
    } else {
        format!("{package_version} ({git_hash} {build_date})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, tbr: f64) -> FormatDescriptor {
        FormatDescriptor {
            format_id: Some(id.to_string()),
            ext: Some("mp4".to_string()),
            vcodec: Some("h264".to_string()),
            acodec: Some("none".to_string()),
            tbr: Some(tbr),
            ..Default::default()
        }
    }

    fn audio(id: &str, abr: f64) -> FormatDescriptor {
        FormatDescriptor {
            format_id: Some(id.to_string()),
            ext: Some("m4a".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("aac".to_string()),
            abr: Some(abr),
            ..Default::default()
        }
    }

    #[test]
    fn end_to_end_bestvideo_plus_bestaudio() {
        let host = Rc::new(StaticHost::default());
        let select = build_format_selector("bestvideo+bestaudio", host).unwrap();

        let formats = vec![video("v1", 1000.0), audio("a1", 128.0)];
        let result = select(&formats, Rc::new(BTreeMap::new()));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].format_id.as_deref(), Some("v1+a1"));
    }

    #[test]
    fn check_format_excludes_unreachable_candidates() {
        let host = Rc::new(StaticHost {
            reachable_format_ids: Some(vec!["v_ok".to_string(), "a1".to_string()]),
            ..Default::default()
        });
        let select = build_format_selector("bestvideo+bestaudio/best", host).unwrap();

        let formats = vec![video("v_blocked", 2000.0), video("v_ok", 500.0), audio("a1", 128.0)];
        let result = select(&formats, Rc::new(BTreeMap::new()));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].format_id.as_deref(), Some("v_ok+a1"));
    }

    #[test]
    fn empty_spec_defaults_to_best() {
        let host = Rc::new(StaticHost::default());
        let select = build_format_selector("", host).unwrap();
        let formats = vec![video("v1", 1000.0)];
        let result = select(&formats, Rc::new(BTreeMap::new()));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn invalid_spec_is_rejected_at_build_time() {
        let host = Rc::new(StaticHost::default());
        assert!(build_format_selector("best+", host).is_err());
    }
}
