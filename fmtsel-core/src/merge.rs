use crate::context::EvalContext;
use crate::model::{format_resolution, FormatDescriptor, FormatType};

/// Remove duplicates from a `Vec`, keeping the first occurrence in place.
/// Adapted from the distilled spec's `orderedSet`; mirrors the teacher's
/// own `real_dedup_vec` helper (stdlib `dedup` only removes consecutive
/// duplicates, which isn't enough here).
fn ordered_dedup<T: Clone + PartialEq>(input: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(input.len());
    for item in input {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Cheap heuristic standing in for yt-dlp's `determine_protocol`: recompute
/// a part's protocol from its URL rather than trusting a possibly-stale
/// `protocol` field.
fn determine_protocol(format: &FormatDescriptor) -> String {
    let Some(url) = &format.url else {
        return format.protocol.clone().unwrap_or_default();
    };
    if url.contains(".m3u8") {
        "m3u8".to_string()
    } else if url.contains(".mpd") {
        "dash".to_string()
    } else if let Some(scheme) = url.split("://").next() {
        if url.contains("://") {
            scheme.to_string()
        } else {
            format.protocol.clone().unwrap_or_default()
        }
    } else {
        format.protocol.clone().unwrap_or_default()
    }
}

/// Walk `formats` (descending into `requested_formats` for anything
/// already merged) and yield elementary parts, enforcing a multiplicity
/// policy: one audio and one video slot by default, more only if
/// `optional` is false and the context explicitly allows it.
pub fn decompose_formats<'a>(
    formats: impl IntoIterator<Item = &'a FormatDescriptor>,
    ctx: &EvalContext,
    optional: bool,
) -> Vec<FormatDescriptor> {
    let mut needs_audio = true;
    let mut needs_video = true;
    let mut out = Vec::new();

    let elementary = formats.into_iter().flat_map(|f| match &f.requested_formats {
        Some(parts) => parts.iter().collect::<Vec<_>>(),
        None => vec![f],
    });

    for f in elementary {
        let mut keep = false;
        if FormatType::Audio.isin(f) && needs_audio {
            keep = true;
            needs_audio = !optional && ctx.allow_multiple_audio_streams;
        }
        if FormatType::Video.isin(f) && needs_video {
            keep = true;
            needs_video = !optional && ctx.allow_multiple_video_streams;
        }
        if keep {
            out.push(f.clone());
        }
    }
    out
}

/// Flatten `formats` down to elementary (non-merged) parts with no
/// multiplicity cap — every audio and video part any of them carries,
/// unconditionally. This is what probing a format for reachability needs:
/// checking each underlying stream regardless of how many of each kind
/// the original selector would have allowed through.
pub fn elementary_parts(formats: &[FormatDescriptor]) -> Vec<FormatDescriptor> {
    formats
        .iter()
        .flat_map(|f| match &f.requested_formats {
            Some(parts) => parts.clone(),
            None => vec![f.clone()],
        })
        .collect()
}

/// Combine `formats` into a single synthesized descriptor, honoring the
/// merge policy of §4.1: single-slot inputs pass through unchanged, joined
/// fields use `+`, video/audio-sourced fields come from whichever part is
/// the sole representative of its type.
pub fn merge_formats(
    formats: &[FormatDescriptor],
    ctx: &EvalContext,
    optional: bool,
) -> FormatDescriptor {
    let parts = decompose_formats(formats, ctx, optional);
    if parts.len() == 1 {
        return parts.into_iter().next().unwrap();
    }

    let video_parts: Vec<&FormatDescriptor> =
        parts.iter().filter(|f| FormatType::Video.isin(f)).collect();
    let audio_parts: Vec<&FormatDescriptor> =
        parts.iter().filter(|f| FormatType::Audio.isin(f)).collect();

    let only_video = (video_parts.len() == 1).then(|| video_parts[0]);
    let only_audio = (audio_parts.len() == 1).then(|| audio_parts[0]);

    let ext = ctx
        .merge_output_format
        .clone()
        .or_else(|| only_video.and_then(|v| v.ext.clone()))
        .or_else(|| {
            if video_parts.is_empty() {
                only_audio.and_then(|a| a.ext.clone())
            } else {
                None
            }
        })
        .unwrap_or_else(|| "mkv".to_string());

    let join = |values: Vec<String>| -> Option<String> {
        if values.is_empty() {
            None
        } else {
            Some(values.join("+"))
        }
    };

    let format_ids: Vec<String> = parts.iter().filter_map(|f| f.format_id.clone()).collect();
    let formats_joined: Vec<String> = parts.iter().filter_map(|f| f.format.clone()).collect();
    let languages: Vec<String> =
        ordered_dedup(parts.iter().filter_map(|f| f.language.clone()).collect());
    let format_notes: Vec<String> = ordered_dedup(
        parts
            .iter()
            .filter_map(|f| f.format_note.clone())
            .filter(|s| !s.is_empty())
            .collect(),
    );
    let protocols: Vec<String> = parts.iter().map(determine_protocol).collect();

    let filesize_sum: u64 = parts
        .iter()
        .filter_map(|f| f.filesize.or(f.filesize_approx))
        .sum();
    let tbr_sum: f64 = parts
        .iter()
        .filter_map(|f| f.tbr.or(f.vbr).or(f.abr))
        .sum();

    FormatDescriptor {
        format_id: join(format_ids),
        format: join(formats_joined),
        ext: Some(ext),
        protocol: Some(protocols.join("+")),
        language: join(languages),
        format_note: join(format_notes),
        filesize_approx: (filesize_sum != 0).then_some(filesize_sum),
        tbr: Some(tbr_sum),
        width: only_video.and_then(|v| v.width),
        height: only_video.and_then(|v| v.height),
        resolution: only_video.map(|v| format_resolution(v, "unknown")),
        fps: only_video.and_then(|v| v.fps),
        dynamic_range: only_video.and_then(|v| v.dynamic_range.clone()),
        stretched_ratio: only_video.and_then(|v| v.stretched_ratio),
        vcodec: only_video.and_then(|v| v.vcodec.clone()),
        vbr: only_video.and_then(|v| v.vbr),
        acodec: only_audio.and_then(|a| a.acodec.clone()),
        abr: only_audio.and_then(|a| a.abr),
        asr: only_audio.and_then(|a| a.asr),
        requested_formats: Some(parts),
        ..Default::default()
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
    fn merge_closure_for_single_part() {
        let v = video("v1", 1000.0);
        let ctx = EvalContext::for_tests(&[v.clone()]);
        let merged = merge_formats(&[v.clone()], &ctx, false);
        assert_eq!(merged.format_id, v.format_id);
        assert_eq!(merged.ext, v.ext);
    }

    #[test]
    fn merge_takes_ext_from_the_sole_video_part() {
        let v = video("v1", 1000.0);
        let a = audio("a1", 128.0);
        let ctx = EvalContext::for_tests(&[v.clone(), a.clone()]);
        let merged = merge_formats(&[v, a], &ctx, false);
        assert_eq!(merged.ext.as_deref(), Some("mp4"));
        assert_eq!(merged.format_id.as_deref(), Some("v1+a1"));
        assert_eq!(merged.tbr, Some(1128.0));
    }

    #[test]
    fn merge_falls_back_to_mkv_without_video_part_or_override() {
        let a1 = audio("a1", 128.0);
        let mut a2 = audio("a2", 64.0);
        a2.ext = Some("webm".to_string());
        let mut ctx = EvalContext::for_tests(&[a1.clone(), a2.clone()]);
        ctx.allow_multiple_audio_streams = true;
        let merged = merge_formats(&[a1, a2], &ctx, false);
        assert_eq!(merged.ext.as_deref(), Some("mkv"));
    }

    #[test]
    fn merge_output_format_wins_over_part_ext() {
        let v = video("v1", 1000.0);
        let a = audio("a1", 128.0);
        let mut ctx = EvalContext::for_tests(&[v.clone(), a.clone()]);
        ctx.merge_output_format = Some("mp4".to_string());
        let merged = merge_formats(&[v, a], &ctx, false);
        assert_eq!(merged.ext.as_deref(), Some("mp4"));
    }

    #[test]
    fn decompose_suppresses_second_audio_by_default() {
        let a1 = audio("a1", 128.0);
        let a2 = audio("a2", 64.0);
        let ctx = EvalContext::for_tests(&[a1.clone(), a2.clone()]);
        let decomposed = decompose_formats(&[a1, a2], &ctx, false);
        assert_eq!(decomposed.len(), 1);
    }

    #[test]
    fn merge_joins_format_and_carries_stretched_ratio() {
        let mut v = video("v1", 1000.0);
        v.format = Some("137 - 1920x1080 (1080p)".to_string());
        v.stretched_ratio = Some(1.5);
        let mut a = audio("a1", 128.0);
        a.format = Some("140 - audio only (medium)".to_string());
        let ctx = EvalContext::for_tests(&[v.clone(), a.clone()]);
        let merged = merge_formats(&[v, a], &ctx, false);
        assert_eq!(
            merged.format.as_deref(),
            Some("137 - 1920x1080 (1080p)+140 - audio only (medium)")
        );
        assert_eq!(merged.stretched_ratio, Some(1.5));
    }

    #[test]
    fn decompose_allows_multiple_audio_when_context_permits() {
        let a1 = audio("a1", 128.0);
        let a2 = audio("a2", 64.0);
        let mut ctx = EvalContext::for_tests(&[a1.clone(), a2.clone()]);
        ctx.allow_multiple_audio_streams = true;
        let decomposed = decompose_formats(&[a1, a2], &ctx, false);
        assert_eq!(decomposed.len(), 2);
    }
}
