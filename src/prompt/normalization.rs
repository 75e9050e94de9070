/// Prompt asking the normalizer model to map every collected label to a
/// canonical form, returned as a bare JSON object.
pub fn normalization_prompt(combined_list: &str) -> String {
    format!(
        r#"You are an expert at data normalization and entity recognition. I have collected lists of companies from multiple AI models, and I need you to normalize these items to identify duplicates and variations of the same entity.

Here is the combined list of items:
{combined_list}

Please follow these guidelines:
1. Identify items that refer to the same entity (e.g., "Meta" and "Facebook", "SpaceX" and "Space X", etc.)
2. Create a mapping of original items to their normalized form
3. Use the most common or official name as the normalized form when possible
4. Format your response as a JSON object where keys are original items and values are normalized items
5. If an item doesn't need normalization, map it to itself
6. Be thorough - capture all possible duplicates, abbreviations, and variations

For example, if the list contains "Facebook", "Meta", and "Meta Platforms", your JSON might have:
{{
  "Facebook": "Meta Platforms Inc.",
  "Meta": "Meta Platforms Inc.",
  "Meta Platforms": "Meta Platforms Inc."
}}

Return ONLY the JSON object without any explanations or additional text."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_item_list() {
        let prompt = normalization_prompt("Uber\nLyft");
        assert!(prompt.contains("Uber\nLyft"));
        assert!(prompt.contains("JSON object"));
    }
}
