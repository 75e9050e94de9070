use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::error::AnalysisError;
use crate::types::{RankedEntity, SourceList};
use crate::TARGET_PIPELINE;

/// Ranked entities for one category plus the per-source latencies that
/// produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub entities: Vec<RankedEntity>,
    pub source_latencies: BTreeMap<String, f64>,
}

/// Rank canonical labels by how many distinct sources produced them.
///
/// Each source votes at most once per label: textual variants that
/// normalized to the same canonical form collapse before counting. Ties
/// break by contributing-source count (an explicit secondary key, kept
/// separate in case frequency ever becomes weighted) and then by label, so
/// equal inputs always produce byte-identical output.
pub fn rank(lists: &[SourceList], short_list_size: usize) -> Ranking {
    let mut contributors: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut source_latencies = BTreeMap::new();

    for list in lists {
        source_latencies.insert(list.source_id.clone(), list.elapsed_seconds);

        // One vote per source per canonical label.
        let mut voted: HashSet<&str> = HashSet::new();
        for item in &list.items {
            let label = item.trim();
            if label.is_empty() || !voted.insert(label) {
                continue;
            }
            contributors
                .entry(label.to_string())
                .or_default()
                .insert(list.source_id.clone());
        }
    }

    let mut sorted: Vec<(String, BTreeSet<String>)> = contributors.into_iter().collect();
    sorted.sort_by(|(label_a, sources_a), (label_b, sources_b)| {
        let frequency_a = sources_a.len();
        let frequency_b = sources_b.len();
        // Frequency, then contributing-source count, then label. The first
        // two coincide under distinct-source counting but the second key is
        // deliberate, not accidental.
        (Reverse(frequency_a), Reverse(sources_a.len()), label_a).cmp(&(
            Reverse(frequency_b),
            Reverse(sources_b.len()),
            label_b,
        ))
    });

    let entities = sorted
        .into_iter()
        .take(short_list_size)
        .enumerate()
        .map(|(index, (label, sources))| RankedEntity {
            rank: index + 1,
            label,
            frequency: sources.len(),
            sources: sources.into_iter().collect(),
        })
        .collect();

    Ranking {
        entities,
        source_latencies,
    }
}

/// Re-rank from scratch using only the retained sources. Previous results
/// are discarded, not patched. Fails when the caller filtered out every
/// source.
pub fn recalculate(
    lists: &[SourceList],
    retained_sources: &HashSet<String>,
    short_list_size: usize,
) -> Result<Ranking, AnalysisError> {
    if retained_sources.is_empty() {
        return Err(AnalysisError::Recalculation);
    }

    let retained: Vec<SourceList> = lists
        .iter()
        .filter(|list| retained_sources.contains(&list.source_id))
        .cloned()
        .collect();
    if retained.is_empty() {
        return Err(AnalysisError::Recalculation);
    }

    debug!(
        target: TARGET_PIPELINE,
        "Recalculating over {}/{} source lists", retained.len(), lists.len()
    );
    Ok(rank(&retained, short_list_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn list(source_id: &str, items: &[&str]) -> SourceList {
        SourceList {
            source_id: source_id.to_string(),
            category: Category::Incumbent,
            items: items.iter().map(|s| s.to_string()).collect(),
            error: None,
            elapsed_seconds: 1.5,
        }
    }

    #[test]
    fn test_frequency_ranking_with_provenance() {
        let lists = vec![
            list("A", &["X", "Y"]),
            list("B", &["X"]),
            list("C", &["X", "Y", "Z"]),
        ];
        let ranking = rank(&lists, 2);

        assert_eq!(ranking.entities.len(), 2);
        assert_eq!(ranking.entities[0].rank, 1);
        assert_eq!(ranking.entities[0].label, "X");
        assert_eq!(ranking.entities[0].frequency, 3);
        assert_eq!(ranking.entities[0].sources, vec!["A", "B", "C"]);

        assert_eq!(ranking.entities[1].rank, 2);
        assert_eq!(ranking.entities[1].label, "Y");
        assert_eq!(ranking.entities[1].frequency, 2);
        assert_eq!(ranking.entities[1].sources, vec!["A", "C"]);
    }

    #[test]
    fn test_single_source_votes_once_per_label() {
        // Two raw variants that normalized to the same canonical label.
        let lists = vec![list("A", &["Meta", "Meta"]), list("B", &["Meta"])];
        let ranking = rank(&lists, 10);

        assert_eq!(ranking.entities[0].frequency, 2);
    }

    #[test]
    fn test_lexicographic_tiebreak_is_deterministic() {
        let lists = vec![list("A", &["Zeta", "Alpha"]), list("B", &["Alpha", "Zeta"])];
        let first = rank(&lists, 10);
        let second = rank(&lists, 10);

        assert_eq!(first.entities, second.entities);
        assert_eq!(first.entities[0].label, "Alpha");
        assert_eq!(first.entities[1].label, "Zeta");
    }

    #[test]
    fn test_truncation_and_latencies() {
        let lists = vec![list("A", &["X", "Y", "Z"])];
        let ranking = rank(&lists, 1);

        assert_eq!(ranking.entities.len(), 1);
        assert_eq!(ranking.source_latencies["A"], 1.5);
    }

    #[test]
    fn test_recalculate_filters_sources() {
        let lists = vec![list("A", &["X"]), list("B", &["Y"])];
        let retained: HashSet<String> = ["B".to_string()].into_iter().collect();

        let ranking = recalculate(&lists, &retained, 10).unwrap();
        assert_eq!(ranking.entities.len(), 1);
        assert_eq!(ranking.entities[0].label, "Y");
    }

    #[test]
    fn test_recalculate_with_no_sources_fails() {
        let lists = vec![list("A", &["X"])];
        assert_eq!(
            recalculate(&lists, &HashSet::new(), 10),
            Err(AnalysisError::Recalculation)
        );

        let unknown: HashSet<String> = ["Z".to_string()].into_iter().collect();
        assert_eq!(
            recalculate(&lists, &unknown, 10),
            Err(AnalysisError::Recalculation)
        );
    }
}
