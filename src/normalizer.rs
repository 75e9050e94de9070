use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::AnalysisError;
use crate::llm::generate_llm_response;
use crate::prompt::normalization_prompt;
use crate::types::{NormalizationMap, SourceList};
use crate::{LLMParams, TARGET_PIPELINE};

lazy_static! {
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n\s*```").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"(?s)`(\{.*?\})`").unwrap();
}

pub struct NormalizationOutcome {
    pub map: NormalizationMap,
    pub lists: Vec<SourceList>,
}

/// Resolve textual variants of the same entity to one canonical label across
/// every source and category, with a single batch call to the normalizer
/// model.
///
/// `extra_labels` lets the caller push additional labels (the control set)
/// through the same canonical space without them appearing in any source
/// list. Fails with `EmptyInput` when there is nothing to normalize and with
/// `NormalizationParse` when no extraction strategy can read the model's
/// reply; there is no silent fallback to un-normalized data.
pub async fn normalize_lists(
    params: &LLMParams,
    lists: Vec<SourceList>,
    extra_labels: &[String],
) -> Result<NormalizationOutcome, AnalysisError> {
    let unique_items = collect_unique_items(&lists, extra_labels);
    if unique_items.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    info!(
        target: TARGET_PIPELINE,
        "Normalizing {} distinct labels across {} source lists",
        unique_items.len(),
        lists.len()
    );

    let prompt = normalization_prompt(&unique_items.join("\n"));
    let response = generate_llm_response(&prompt, params)
        .await
        .map_err(|e| AnalysisError::NormalizationQuery(e.to_string()))?;

    let entries = extract_json_map(&response)?;
    info!(
        target: TARGET_PIPELINE,
        "Normalizer returned {} explicit mappings", entries.len()
    );

    let map = NormalizationMap::new(entries);
    let lists = lists
        .into_iter()
        .map(|list| apply_map(list, &map))
        .collect();

    Ok(NormalizationOutcome { map, lists })
}

/// Union of all distinct trimmed items, insertion-ordered so the prompt (and
/// therefore the normalizer's view of the data) is deterministic.
fn collect_unique_items(lists: &[SourceList], extra_labels: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    let items = lists
        .iter()
        .flat_map(|list| list.items.iter())
        .chain(extra_labels.iter());

    for item in items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            unique.push(trimmed.to_string());
        }
    }

    unique
}

/// Replace every item with its canonical form. Labels the normalizer left
/// out pass through unchanged via the map's identity fallback.
fn apply_map(mut list: SourceList, map: &NormalizationMap) -> SourceList {
    list.items = list
        .items
        .iter()
        .map(|item| map.canonical(item).to_string())
        .collect();
    list
}

/// Pull a JSON object out of a model reply that may be wrapped in markdown
/// fences, inline code, or explanatory prose. Strategies are tried in order;
/// the first one that parses to an object wins.
fn extract_json_map(content: &str) -> Result<HashMap<String, String>, AnalysisError> {
    let strategies: [fn(&str) -> Option<Value>; 4] = [
        parse_direct,
        parse_fenced_block,
        parse_inline_code,
        parse_brace_span,
    ];

    for strategy in strategies {
        if let Some(Value::Object(object)) = strategy(content) {
            return Ok(object_to_string_map(object));
        }
    }

    warn!(
        target: TARGET_PIPELINE,
        "All JSON extraction strategies failed on {} chars of normalizer output",
        content.len()
    );
    Err(AnalysisError::NormalizationParse(format!(
        "tried 4 extraction strategies on {} chars",
        content.len()
    )))
}

fn parse_direct(content: &str) -> Option<Value> {
    serde_json::from_str(content.trim()).ok()
}

fn parse_fenced_block(content: &str) -> Option<Value> {
    let captures = FENCED_BLOCK.captures(content)?;
    serde_json::from_str(captures.get(1)?.as_str()).ok()
}

fn parse_inline_code(content: &str) -> Option<Value> {
    let captures = INLINE_CODE.captures(content)?;
    serde_json::from_str(captures.get(1)?.as_str()).ok()
}

/// Last resort: the span from the first `{` to the last `}`.
fn parse_brace_span(content: &str) -> Option<Value> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

fn object_to_string_map(object: Map<String, Value>) -> HashMap<String, String> {
    let mut entries = HashMap::with_capacity(object.len());
    for (key, value) in object {
        match value {
            Value::String(canonical) => {
                entries.insert(key.trim().to_string(), canonical.trim().to_string());
            }
            other => {
                // Non-string values are model noise; dropping the key means
                // the label self-maps, which is the safe default.
                debug!(
                    target: TARGET_PIPELINE,
                    "Dropping non-string mapping for '{}': {}", key, other
                );
            }
        }
    }
    entries
}
