use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::info;

use crate::types::{EvaluationMetrics, NormalizationMap, RankedEntity, SourceList};
use crate::TARGET_PIPELINE;

/// Score the ranked output against a user-supplied control set.
///
/// Control labels are pushed through the same normalization map as the
/// discovered entities, so both sides live in one canonical space. Precision
/// is measured over the short list; recall over everything discovered, with
/// the original (pre-normalization) control-set size as the denominator.
/// Empty denominators yield 0.0, never NaN.
pub fn evaluate(
    control_set: &[String],
    short_list: &[RankedEntity],
    discovered: &HashSet<String>,
    source_lists: &[SourceList],
    map: &NormalizationMap,
) -> EvaluationMetrics {
    let normalized_control: HashSet<String> = control_set
        .iter()
        .map(|label| map.canonical(label).to_string())
        .collect();

    let hits = short_list
        .iter()
        .filter(|entity| normalized_control.contains(&entity.label))
        .count();
    let precision = ratio(hits, short_list.len());

    let found = control_set
        .iter()
        .filter(|label| discovered.contains(map.canonical(label)))
        .count();
    let recall = ratio(found, control_set.len());

    // Per-source scores use each source's deduplicated union of items in
    // place of the short list and the discovered set.
    let mut per_source_precision = BTreeMap::new();
    let mut per_source_recall = BTreeMap::new();
    for (source_id, items) in items_by_source(source_lists) {
        let source_hits = items
            .iter()
            .filter(|item| normalized_control.contains(*item))
            .count();
        let source_found = control_set
            .iter()
            .filter(|label| items.contains(map.canonical(label)))
            .count();

        per_source_precision.insert(source_id.clone(), ratio(source_hits, items.len()));
        per_source_recall.insert(source_id, ratio(source_found, control_set.len()));
    }

    info!(
        target: TARGET_PIPELINE,
        "Evaluation: precision {:.3} ({}/{}), recall {:.3} ({}/{})",
        precision,
        hits,
        short_list.len(),
        recall,
        found,
        control_set.len()
    );

    EvaluationMetrics {
        precision,
        recall,
        per_source_precision,
        per_source_recall,
    }
}

/// Deduplicated union of items per source, across all of that source's
/// category lists.
fn items_by_source(source_lists: &[SourceList]) -> BTreeMap<String, BTreeSet<String>> {
    let mut by_source: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for list in source_lists {
        let entry = by_source.entry(list.source_id.clone()).or_default();
        for item in &list.items {
            let label = item.trim();
            if !label.is_empty() {
                entry.insert(label.to_string());
            }
        }
    }
    by_source
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Whole-percent rendering for display; internal values keep full precision.
pub fn as_percent(value: f64) -> String {
    format!("{}%", (value * 100.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::collections::HashMap;

    fn ranked(labels: &[&str]) -> Vec<RankedEntity> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| RankedEntity {
                rank: index + 1,
                label: label.to_string(),
                frequency: 1,
                sources: vec!["a".to_string()],
            })
            .collect()
    }

    fn control(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn list(source_id: &str, items: &[&str]) -> SourceList {
        SourceList {
            source_id: source_id.to_string(),
            category: Category::Incumbent,
            items: items.iter().map(|s| s.to_string()).collect(),
            error: None,
            elapsed_seconds: 1.0,
        }
    }

    #[test]
    fn test_precision_and_recall_with_normalization_asymmetry() {
        // "Bird" in the control set normalizes to the discovered "Bird
        // Global"; "Lime" self-maps.
        let mut entries = HashMap::new();
        entries.insert("Bird".to_string(), "Bird Global".to_string());
        let map = NormalizationMap::new(entries);

        let discovered: HashSet<String> = ["Lime", "Spin", "Bird Global"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let metrics = evaluate(
            &control(&["Bird", "Lime"]),
            &ranked(&["Lime", "Spin"]),
            &discovered,
            &[],
            &map,
        );

        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 1.0);
    }

    #[test]
    fn test_empty_denominators_yield_zero() {
        let map = NormalizationMap::default();
        let discovered = HashSet::new();

        let metrics = evaluate(&control(&["Bird"]), &[], &discovered, &[], &map);
        assert_eq!(metrics.precision, 0.0);
        assert!(!metrics.precision.is_nan());

        let metrics = evaluate(&[], &ranked(&["Lime"]), &discovered, &[], &map);
        assert_eq!(metrics.recall, 0.0);
        assert!(!metrics.recall.is_nan());
    }

    #[test]
    fn test_bounds_hold() {
        let map = NormalizationMap::default();
        let discovered: HashSet<String> =
            ["Lime".to_string(), "Spin".to_string()].into_iter().collect();

        let metrics = evaluate(
            &control(&["Lime", "Spin"]),
            &ranked(&["Lime", "Spin"]),
            &discovered,
            &[],
            &map,
        );
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
    }

    #[test]
    fn test_per_source_metrics() {
        let map = NormalizationMap::default();
        let discovered: HashSet<String> = ["Lime".to_string()].into_iter().collect();
        let lists = vec![
            list("good-model", &["Lime", "Spin"]),
            list("bad-model", &["Acme"]),
        ];

        let metrics = evaluate(
            &control(&["Lime"]),
            &ranked(&["Lime"]),
            &discovered,
            &lists,
            &map,
        );

        assert_eq!(metrics.per_source_precision["good-model"], 0.5);
        assert_eq!(metrics.per_source_recall["good-model"], 1.0);
        assert_eq!(metrics.per_source_precision["bad-model"], 0.0);
        assert_eq!(metrics.per_source_recall["bad-model"], 0.0);
    }

    #[test]
    fn test_percent_rendering_rounds_at_presentation_only() {
        assert_eq!(as_percent(0.5), "50%");
        assert_eq!(as_percent(0.666), "67%");
        assert_eq!(as_percent(0.0), "0%");
    }
}
