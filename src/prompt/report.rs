use std::collections::BTreeMap;

use crate::types::{Category, RankedEntity};

/// Prompt for a short factual company description, used when the caller did
/// not supply one.
pub fn company_description_prompt(company_name: &str) -> String {
    format!(
        r#"Generate a concise 2-3 sentence description for the company "{company_name}".
Focus on what the company does, its target market, and any notable features or services.
Keep it factual and professional.

Return only the description with no additional text."#
    )
}

/// Prompt for the free-form narrative report summarizing the ranked
/// competitor buckets.
pub fn report_prompt(
    company_name: &str,
    company_description: &str,
    ranked: &BTreeMap<Category, Vec<RankedEntity>>,
) -> String {
    let mut sections = String::new();
    for (category, entities) in ranked {
        if entities.is_empty() {
            continue;
        }
        sections.push_str(&format!("\n{} competitors:\n", category));
        for entity in entities {
            sections.push_str(&format!(
                "{}. {} (named by {} of the queried models)\n",
                entity.rank,
                entity.label,
                entity.frequency
            ));
        }
    }

    format!(
        r#"You are a competitive intelligence analyst. Write a competitor landscape report for "{company_name}".

Company context: {company_description}

The following competitors were identified by querying multiple independent AI models and ranking the answers by agreement:
{sections}

Please follow these guidelines:
1. Write one section per competitor category, with a markdown heading
2. For each category, briefly characterize the competitive dynamics and call out the top two or three entries
3. Treat higher agreement counts as stronger signals, but note where the models disagreed
4. Close with a short overall assessment of {company_name}'s competitive position
5. Keep the report factual and under 800 words"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_prompt_lists_ranked_entities() {
        let mut ranked = BTreeMap::new();
        ranked.insert(
            Category::Incumbent,
            vec![RankedEntity {
                rank: 1,
                label: "Bird Global".to_string(),
                frequency: 4,
                sources: vec!["a".to_string()],
            }],
        );
        ranked.insert(Category::Graveyard, Vec::new());

        let prompt = report_prompt("Lime", "Shared scooters", &ranked);
        assert!(prompt.contains("incumbent competitors:"));
        assert!(prompt.contains("1. Bird Global (named by 4 of the queried models)"));
        // Empty categories are left out of the prompt entirely.
        assert!(!prompt.contains("graveyard competitors:"));
    }
}
