use crate::types::Category;

// Shared formatting rules appended to every category prompt. The pipeline
// only relies on the response being a numbered list of bare company names.
fn list_guidelines(count: usize) -> String {
    format!(
        r#"Please follow these guidelines:
1. List up to {count} distinct competitors
2. Format your response as a numbered list (1., 2., 3., etc.)
3. List ONLY the company name (e.g., "Uber" not "Uber - a ridesharing app")
4. Only include true direct competitors, not partners or suppliers
5. Only provide the list - no explanations or introductions"#
    )
}

/// Prompt for established, large players in the same market.
pub fn incumbent_prompt(company_name: &str, company_description: &str, count: usize) -> String {
    format!(
        r#"You are a competitive intelligence expert specializing in market research. Your task is to generate a list of up to {count} INCUMBENT companies that directly compete with "{company_name}".

Additional company context: {company_description}

For INCUMBENTS, focus on:
1. Established, large players in the same market as {company_name}
2. Well-known, primary competitors with significant market share
3. Companies whose core products/services directly compete with {company_name}'s offerings and target overlapping customer segments

{guidelines}

Your list of incumbent competitors to "{company_name}":"#,
        guidelines = list_guidelines(count)
    )
}

/// Prompt for region-bound competitors; the model infers the relevant
/// regions from the company description.
pub fn regional_prompt(company_name: &str, company_description: &str, count: usize) -> String {
    format!(
        r#"You are a competitive intelligence expert focusing on regional market analysis. For the company "{company_name}", identify up to {count} REGION-SPECIFIC competitors.

Additional company context: {company_description}

Based on the provided company context, infer the primary geographic operating region(s) of {company_name}. Focus your search for competitors primarily active within those specific regions.

For REGIONAL PLAYERS, focus on:
1. Companies that operate primarily in specific geographic regions rather than globally
2. Local alternatives to {company_name} within specific geographic markets
3. Region-specific competitors with strong local presence
4. Companies that may be large in their region but less known globally

{guidelines}

Your list of regional competitors to "{company_name}":"#,
        guidelines = list_guidelines(count)
    )
}

/// Variant of the regional prompt pinned to an explicit region, used when
/// the caller selects one instead of letting the model infer it.
pub fn region_specific_prompt(
    company_name: &str,
    company_description: &str,
    region: &str,
    count: usize,
) -> String {
    format!(
        r#"You are a competitive intelligence expert focusing on regional market analysis. For the company "{company_name}", identify up to {count} REGION-SPECIFIC competitors in {region}.

Additional company context: {company_description}

For REGIONAL PLAYERS in {region}, focus on:
1. Companies that operate primarily in {region} rather than globally
2. Local alternatives to {company_name} within {region}
3. Region-specific competitors with strong local presence in {region}
4. Companies that may be large in {region} but less known globally

{guidelines}

Your list of {region} regional competitors to "{company_name}":"#,
        guidelines = list_guidelines(count)
    )
}

/// Prompt for novel threats: disruptors, adjacent-industry entrants,
/// unusual business models.
pub fn interesting_prompt(company_name: &str, company_description: &str, count: usize) -> String {
    format!(
        r#"You are a competitive intelligence expert focusing on unique business models and market dynamics. For the company "{company_name}", identify up to {count} INTERESTING competitors.

Additional company context: {company_description}

The goal is to identify competitors that represent novel threats, innovative strategies, or market shifts relevant to {company_name}.

For INTERESTING CASES, focus on:
1. Companies tackling the same customer problem as {company_name} but with significantly innovative or disruptive technology, business models, or value propositions
2. Large, established companies from adjacent industries that are actively entering or exploring {company_name}'s market space
3. Startups with novel technologies or business models challenging incumbents
4. Companies that pivoted into this space from different industries

{guidelines}

Your list of interesting competitors to "{company_name}":"#,
        guidelines = list_guidelines(count)
    )
}

/// Prompt for former competitors: bankrupt, acquired, pivoted, or faded.
pub fn graveyard_prompt(company_name: &str, company_description: &str, count: usize) -> String {
    format!(
        r#"You are a competitive intelligence expert focusing on market history. For the company "{company_name}", identify up to {count} FORMER competitors.

Additional company context: {company_description}

Identify up to {count} companies that were previously significant direct competitors to {company_name} but are no longer active threats in their original form.

For GRAVEYARD cases, focus on:
1. Companies in this specific market that went bankrupt or ceased operations
2. Competitors that were acquired by larger players (and potentially absorbed/discontinued)
3. Companies that previously competed directly but pivoted their core business away from this market
4. Once-prominent players in this market that have significantly declined or become negligible competitors

{guidelines}

Your list of former competitors to "{company_name}":"#,
        guidelines = list_guidelines(count)
    )
}

/// Dispatch to the right generator for a category. The regional category
/// uses the pinned-region variant when a region was selected.
pub fn prompt_for_category(
    category: Category,
    company_name: &str,
    company_description: &str,
    count: usize,
    region: Option<&str>,
) -> String {
    match category {
        Category::Incumbent => incumbent_prompt(company_name, company_description, count),
        Category::Regional => match region {
            Some(region) => {
                region_specific_prompt(company_name, company_description, region, count)
            }
            None => regional_prompt(company_name, company_description, count),
        },
        Category::Interesting => interesting_prompt(company_name, company_description, count),
        Category::Graveyard => graveyard_prompt(company_name, company_description, count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_mention_company_and_count() {
        for category in Category::ALL {
            let prompt = prompt_for_category(category, "Lime", "Shared scooters", 15, None);
            assert!(prompt.contains("Lime"), "{} prompt missing company", category);
            assert!(prompt.contains("15"), "{} prompt missing count", category);
            assert!(prompt.contains("numbered list"), "{} prompt missing format", category);
        }
    }

    #[test]
    fn test_regional_prompt_pins_region_when_given() {
        let prompt = prompt_for_category(Category::Regional, "Lime", "Scooters", 10, Some("Europe"));
        assert!(prompt.contains("in Europe"));

        let inferred = prompt_for_category(Category::Regional, "Lime", "Scooters", 10, None);
        assert!(inferred.contains("infer the primary geographic operating region"));
    }
}
