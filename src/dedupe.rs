use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::types::{Category, SourceList};
use crate::TARGET_PIPELINE;

/// Resolve each canonical label to a single owning category and drop it from
/// every other category's lists.
///
/// Ownership goes to the highest-priority category the label appears in
/// anywhere (incumbent > regional > interesting > graveyard). Runs on
/// canonical labels, so variants of one entity were already unified by the
/// normalizer before priority resolution.
pub fn dedupe_categories(
    by_category: BTreeMap<Category, Vec<SourceList>>,
) -> BTreeMap<Category, Vec<SourceList>> {
    let owners = owning_categories(&by_category);

    by_category
        .into_iter()
        .map(|(category, lists)| {
            let filtered = lists
                .into_iter()
                .map(|mut list| {
                    list.items.retain(|item| {
                        owners.get(item.trim()).copied() == Some(category)
                    });
                    list
                })
                .collect();
            (category, filtered)
        })
        .collect()
}

/// Minimum-priority category per canonical label.
fn owning_categories(
    by_category: &BTreeMap<Category, Vec<SourceList>>,
) -> HashMap<String, Category> {
    let mut owners: HashMap<String, Category> = HashMap::new();

    for (category, lists) in by_category {
        for list in lists {
            for item in &list.items {
                let label = item.trim();
                if label.is_empty() {
                    continue;
                }
                owners
                    .entry(label.to_string())
                    .and_modify(|owner| {
                        if category.priority() < owner.priority() {
                            debug!(
                                target: TARGET_PIPELINE,
                                "'{}' reassigned from {} to {}", label, owner, category
                            );
                            *owner = *category;
                        }
                    })
                    .or_insert(*category);
            }
        }
    }

    owners
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(source_id: &str, category: Category, items: &[&str]) -> SourceList {
        SourceList {
            source_id: source_id.to_string(),
            category,
            items: items.iter().map(|s| s.to_string()).collect(),
            error: None,
            elapsed_seconds: 1.0,
        }
    }

    fn input(lists: Vec<SourceList>) -> BTreeMap<Category, Vec<SourceList>> {
        let mut by_category: BTreeMap<Category, Vec<SourceList>> = BTreeMap::new();
        for source_list in lists {
            by_category
                .entry(source_list.category)
                .or_default()
                .push(source_list);
        }
        by_category
    }

    fn items_of(
        deduped: &BTreeMap<Category, Vec<SourceList>>,
        category: Category,
    ) -> Vec<&str> {
        deduped[&category]
            .iter()
            .flat_map(|list| list.items.iter().map(String::as_str))
            .collect()
    }

    #[test]
    fn test_higher_priority_category_wins() {
        let deduped = dedupe_categories(input(vec![
            list("p", Category::Regional, &["Acme", "Grab"]),
            list("q", Category::Incumbent, &["Acme", "Uber"]),
        ]));

        assert_eq!(items_of(&deduped, Category::Incumbent), vec!["Acme", "Uber"]);
        assert_eq!(items_of(&deduped, Category::Regional), vec!["Grab"]);
    }

    #[test]
    fn test_single_category_label_unaffected() {
        let deduped = dedupe_categories(input(vec![
            list("p", Category::Interesting, &["Tortoise"]),
            list("q", Category::Graveyard, &["Spin"]),
        ]));

        assert_eq!(items_of(&deduped, Category::Interesting), vec!["Tortoise"]);
        assert_eq!(items_of(&deduped, Category::Graveyard), vec!["Spin"]);
    }

    #[test]
    fn test_exclusivity_across_all_four_categories() {
        let deduped = dedupe_categories(input(vec![
            list("a", Category::Graveyard, &["Acme"]),
            list("b", Category::Interesting, &["Acme"]),
            list("c", Category::Regional, &["Acme"]),
            list("d", Category::Incumbent, &["Acme"]),
        ]));

        let appearances: usize = Category::ALL
            .iter()
            .map(|category| items_of(&deduped, *category).len())
            .sum();
        assert_eq!(appearances, 1);
        assert_eq!(items_of(&deduped, Category::Incumbent), vec!["Acme"]);
    }

    #[test]
    fn test_empty_lists_pass_through() {
        let deduped = dedupe_categories(input(vec![list("p", Category::Regional, &[])]));
        assert!(items_of(&deduped, Category::Regional).is_empty());
    }
}
