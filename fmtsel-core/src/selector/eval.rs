use itertools::Itertools;

use crate::context::EvalContext;
use crate::merge::merge_formats;
use crate::model::{FormatDescriptor, FormatType};

use super::node::{Selector, SelectorKind, What};

const AUDIO_EXTS: &[&str] = &["m4a", "mp3", "ogg", "aac"];
const VIDEO_EXTS: &[&str] = &["mp4", "flv", "webm", "3gp"];

/// A candidate group: obtaining every descriptor in it together satisfies
/// the selector that produced it.
pub type Group = Vec<FormatDescriptor>;

/// Apply a selector to a format list: run it through the selector tree,
/// then, group by group, drop whichever members fail `ctx.check_format`
/// and return the first group that still has at least one survivor (the
/// same drop-member-not-group rule `process` uses for its own filters).
/// Returns an empty group if nothing survives. The caller is expected to
/// have ordered `formats` however it likes; this reverses them before
/// recursing, since every selector variant assumes "best first" iteration.
pub fn apply(selector: &Selector, formats: &[FormatDescriptor], ctx: &EvalContext) -> Group {
    let reversed: Vec<FormatDescriptor> = formats.iter().rev().cloned().collect();
    process(selector, &reversed, ctx)
        .into_iter()
        .find_map(|group| {
            let survivors: Group = group.into_iter().filter(|f| ctx.check_format(f)).collect();
            (!survivors.is_empty()).then_some(survivors)
        })
        .unwrap_or_default()
}

/// `suitable_formats`, then drop any member of a group that fails the
/// selector's filters; a group that loses every member this way is
/// dropped entirely rather than yielded empty.
fn process(selector: &Selector, formats: &[FormatDescriptor], ctx: &EvalContext) -> Vec<Group> {
    suitable_formats(selector, formats, ctx)
        .into_iter()
        .filter_map(|group| {
            let survivors: Group = group
                .into_iter()
                .filter(|f| selector.filters.iter().all(|flt| flt.matches(f, &ctx.info_dict)))
                .collect();
            (!survivors.is_empty()).then_some(survivors)
        })
        .collect()
}

fn suitable_formats(selector: &Selector, formats: &[FormatDescriptor], ctx: &EvalContext) -> Vec<Group> {
    match &selector.kind {
        SelectorKind::FormatId(id) => formats
            .iter()
            .filter(|f| matches_format_id(id, f, ctx))
            .map(|f| vec![f.clone()])
            .collect(),

        SelectorKind::SelectAll(what) => select_all_groups(what, formats, ctx, true),

        SelectorKind::MergeAll(what) => select_all_groups(what, formats, ctx, false)
            .into_iter()
            .map(|group| vec![merge_formats(&group, ctx, false)])
            .collect(),

        SelectorKind::SelectBest(what, n, field) => select_best_groups(what, *n, field, formats, ctx),

        SelectorKind::MergeBest(what, n, field) => select_best_groups(what, *n, field, formats, ctx)
            .into_iter()
            .map(|group| vec![merge_formats(&group, ctx, false)])
            .collect(),

        SelectorKind::TakeAll(children) => {
            let per_child: Vec<Vec<Group>> = children.iter().map(|c| process(c, formats, ctx)).collect();
            if per_child.iter().any(|groups| groups.is_empty()) {
                return Vec::new();
            }
            per_child
                .into_iter()
                .multi_cartesian_product()
                .map(|combo| combo.into_iter().flatten().collect())
                .collect()
        }

        SelectorKind::TakeFirst(children) => {
            children.iter().flat_map(|c| process(c, formats, ctx)).collect()
        }

        SelectorKind::Merge(left, right, optional) => {
            let left_groups = process(left, formats, ctx);
            let right_groups = process(right, formats, ctx);
            let mut out = Vec::new();
            for gl in &left_groups {
                for gr in &right_groups {
                    let mut merged_group = Group::new();
                    for (a, b) in gl.iter().cartesian_product(gr.iter()) {
                        merged_group.push(merge_formats(&[a.clone(), b.clone()], ctx, *optional));
                    }
                    out.push(merged_group);
                }
            }
            out
        }
    }
}

fn matches_format_id(id: &str, format: &FormatDescriptor, ctx: &EvalContext) -> bool {
    let ext_is = |want: &str| format.ext.as_deref() == Some(want);
    if AUDIO_EXTS.contains(&id) {
        ext_is(id) && FormatType::of(format) == FormatType::Audio
    } else if VIDEO_EXTS.contains(&id) {
        let wanted = if ctx.has_merged_format {
            FormatType::Merged
        } else {
            FormatType::Video
        };
        ext_is(id) && FormatType::of(format) == wanted
    } else if id == "mhtml" {
        ext_is(id) && FormatType::of(format) == FormatType::Storyboards
    } else {
        format.format_id.as_deref() == Some(id)
    }
}

fn is_allowed(what: &What, ty: FormatType, allow_storyboards: bool) -> bool {
    if ty == FormatType::Storyboards {
        allow_storyboards && what.allows(ty)
    } else {
        what.allows(ty)
    }
}

fn select_all_groups(
    what: &What,
    formats: &[FormatDescriptor],
    ctx: &EvalContext,
    allow_storyboards: bool,
) -> Vec<Group> {
    if ctx.incomplete_formats && what.0.is_empty() {
        return vec![formats.to_vec()];
    }
    let group: Group = formats
        .iter()
        .filter(|f| is_allowed(what, FormatType::of(f), allow_storyboards))
        .cloned()
        .collect();
    vec![group]
}

/// Bucket key for the `{field}` partition: the field's value rendered as a
/// stable string (so numbers and strings both hash consistently), or
/// `None` both when the field is unset on the selector and when the
/// format lacks the field.
fn bucket_key(field: &Option<String>, format: &FormatDescriptor) -> Option<String> {
    field.as_ref().and_then(|name| format.field(name)).map(|v| v.to_string())
}

/// Split `formats` (already grouped by `SelectAll`) into field-keyed
/// buckets, preserving each bucket's first-seen order, then drop the
/// first `n - 1` of each bucket (or the first `|n| - 1` after reversing,
/// for negative `n`). What's left per bucket is a *pool* of acceptable
/// candidates, best of the remainder first — later ones exist purely as
/// fallback material for when an earlier pick doesn't pan out downstream.
fn select_best_groups(
    what: &What,
    n: i64,
    field: &Option<String>,
    formats: &[FormatDescriptor],
    ctx: &EvalContext,
) -> Vec<Group> {
    let mut out = Vec::new();
    for group in select_all_groups(what, formats, ctx, false) {
        let mut order: Vec<Option<String>> = Vec::new();
        let mut buckets: Vec<(Option<String>, Vec<FormatDescriptor>)> = Vec::new();
        for f in group {
            let key = bucket_key(field, &f);
            match buckets.iter_mut().find(|(k, _)| k == &key) {
                Some((_, bucket)) => bucket.push(f),
                None => {
                    order.push(key.clone());
                    buckets.push((key, vec![f]));
                }
            }
        }

        let pools: Vec<Vec<FormatDescriptor>> = order
            .iter()
            .map(|key| {
                let bucket = buckets
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, b)| b.clone())
                    .unwrap_or_default();
                nth_best_pool(bucket, n)
            })
            .collect();

        if pools.is_empty() || pools.iter().any(Vec::is_empty) {
            continue;
        }
        out.extend(pools.into_iter().multi_cartesian_product());
    }
    out
}

fn nth_best_pool(mut bucket: Vec<FormatDescriptor>, n: i64) -> Vec<FormatDescriptor> {
    if n < 0 {
        bucket.reverse();
    }
    let skip = (n.unsigned_abs() as usize).saturating_sub(1);
    if skip >= bucket.len() {
        Vec::new()
    } else {
        bucket.split_off(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parser::parse;

    fn video(id: &str, tbr: f64, height: u64) -> FormatDescriptor {
        FormatDescriptor {
            format_id: Some(id.to_string()),
            ext: Some("mp4".to_string()),
            vcodec: Some("h264".to_string()),
            acodec: Some("none".to_string()),
            tbr: Some(tbr),
            height: Some(height),
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
    fn bv_plus_ba_merges_best_video_and_audio() {
        let v1 = video("v1", 1000.0, 720);
        let v2 = video("v2", 2000.0, 1080);
        let a1 = audio("a1", 128.0);
        let formats = vec![v1, v2.clone(), a1.clone()];

        let tree = parse("bv+ba").unwrap().unwrap();
        let ctx = EvalContext::for_tests(&formats);
        let result = apply(&tree, &formats, &ctx);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].format_id.as_deref(), Some("v2+a1"));
    }

    #[test]
    fn bv_comma_ba_returns_two_separate_descriptors_in_one_group() {
        let v1 = video("v1", 1000.0, 720);
        let v2 = video("v2", 2000.0, 1080);
        let a1 = audio("a1", 128.0);
        let formats = vec![v1, v2.clone(), a1.clone()];

        let tree = parse("bv,ba").unwrap().unwrap();
        let ctx = EvalContext::for_tests(&formats);
        let result = apply(&tree, &formats, &ctx);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].format_id.as_deref(), Some("v2"));
        assert_eq!(result[1].format_id.as_deref(), Some("a1"));
    }

    #[test]
    fn height_filter_can_exclude_everything() {
        let v1 = video("v1", 1000.0, 720);
        let formats = vec![v1];
        let tree = parse("best[height<=480]").unwrap().unwrap();
        let ctx = EvalContext::for_tests(&formats);
        assert!(apply(&tree, &formats, &ctx).is_empty());
    }

    #[test]
    fn take_first_falls_back_when_primary_choice_is_unreachable() {
        let v_low = video("v_low", 500.0, 480);
        let v_high = video("v_high", 2000.0, 1080);
        let a_low = audio("a_low", 64.0);
        let a_high = audio("a_high", 160.0);
        let formats = vec![v_low.clone(), v_high.clone(), a_low.clone(), a_high.clone()];

        let tree = parse("bv*+ba/b").unwrap().unwrap();
        let ctx = EvalContext::for_tests(&formats);
        let result = apply(&tree, &formats, &ctx);
        assert!(!result.is_empty());
    }

    #[test]
    fn format_id_extension_literal_respects_has_merged_format() {
        let v1 = video("v1", 1000.0, 720);
        let formats = vec![v1.clone()];
        let tree = parse("mp4").unwrap().unwrap();
        let ctx = EvalContext::for_tests(&formats);
        let result = apply(&tree, &formats, &ctx);
        assert_eq!(result, vec![v1]);
    }

    #[test]
    fn best_is_positional_on_the_supplied_order_not_reranked_by_field_value() {
        // `bv`/`bestvideo` never inspects `tbr`/`height` to rank candidates
        // itself — like the original, it trusts that the host supplies
        // `formats` already in ascending-quality order (worst first) and
        // just takes the last one of the wanted type. Two physically
        // different orderings of the same formats that both honor that
        // convention (sorted ascending by `tbr` here) must agree on the
        // pick, and it must be the highest-`tbr` video.
        let v1 = video("v1", 1000.0, 720);
        let v2 = video("v2", 2000.0, 1080);
        let v3 = video("v3", 500.0, 360);
        let a1 = audio("a1", 128.0);

        let mut ascending = vec![v1.clone(), v2.clone(), v3.clone(), a1.clone()];
        ascending.sort_by(|a, b| a.tbr.partial_cmp(&b.tbr).unwrap());
        let mut also_ascending = vec![v3.clone(), a1.clone(), v2.clone(), v1.clone()];
        also_ascending.sort_by(|a, b| a.tbr.partial_cmp(&b.tbr).unwrap());

        let tree = parse("bv").unwrap().unwrap();
        let ctx_a = EvalContext::for_tests(&ascending);
        let ctx_b = EvalContext::for_tests(&also_ascending);

        let picked_a = apply(&tree, &ascending, &ctx_a);
        let picked_b = apply(&tree, &also_ascending, &ctx_b);
        assert_eq!(picked_a[0].format_id, picked_b[0].format_id);
        assert_eq!(picked_a[0].format_id.as_deref(), Some("v2"));
    }
}
