use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::config::{
    AnalysisConfig, NORMALIZER_MAX_TOKENS, NORMALIZER_TEMPERATURE, QUERY_MAX_TOKENS,
    QUERY_TEMPERATURE,
};
use crate::dedupe::dedupe_categories;
use crate::error::AnalysisError;
use crate::evaluator;
use crate::llm::generate_llm_response;
use crate::normalizer::normalize_lists;
use crate::orchestrator::{ensure_partial_success, run_queries};
use crate::progress::ProgressTracker;
use crate::prompt;
use crate::ranker;
use crate::types::{Category, EvaluationMetrics, NormalizationMap, RankedEntity, SourceList};
use crate::{LLMClient, LLMParams, TARGET_PIPELINE};

/// Model used for company descriptions and the narrative report.
const WRITER_MODEL: &str = "openai/gpt-4o-search-preview";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub company_name: String,
    pub company_description: String,
}

/// The complete output of one analysis run. Normalized, deduplicated lists
/// are retained so recalculation over a source subset never re-queries the
/// network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub company_name: String,
    pub rankings: BTreeMap<Category, Vec<RankedEntity>>,
    pub source_latencies: BTreeMap<String, f64>,
    pub lists: BTreeMap<Category, Vec<SourceList>>,
    pub normalization_map: NormalizationMap,
    pub discovered: HashSet<String>,
    pub control_set: Vec<String>,
    pub metrics: Option<EvaluationMetrics>,
    /// (source, category, message) for every failed query, so the caller can
    /// tell the user how complete the surviving data is.
    pub failed_sources: Vec<(String, Category, String)>,
}

/// Run the whole pipeline: four-category fan-out, parse, global
/// normalization, cross-category dedup, per-category ranking, and (in test
/// mode) control-set evaluation.
pub async fn run_analysis(
    client: &LLMClient,
    config: &AnalysisConfig,
    request: &AnalysisRequest,
    control_set: &[String],
    tracker: &ProgressTracker,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;
    let sources = config.sources();

    info!(
        target: TARGET_PIPELINE,
        "Analyzing '{}' with {} sources across {} categories",
        request.company_name,
        sources.len(),
        Category::ALL.len()
    );

    // Every (category, source) query runs concurrently; the await below is
    // the single join point for all of them.
    let batches = join_all(Category::ALL.into_iter().map(|category| {
        let prompt = prompt::prompt_for_category(
            category,
            &request.company_name,
            &request.company_description,
            config.long_list_size_for(category),
            config.region.as_deref(),
        );
        let sources = sources.clone();
        async move { run_queries(client, &prompt, category, &sources, tracker).await }
    }))
    .await;

    let responses: Vec<_> = batches.into_iter().flatten().collect();
    ensure_partial_success(&responses)?;

    let failed_sources: Vec<(String, Category, String)> = responses
        .iter()
        .filter_map(|response| {
            response
                .error
                .clone()
                .map(|error| (response.source_id.clone(), response.category, error))
        })
        .collect();

    let parsed: Vec<SourceList> = responses.iter().map(SourceList::from_response).collect();

    let normalizer_params = LLMParams {
        llm_client: client.clone(),
        model: config.normalizer_model.clone(),
        temperature: NORMALIZER_TEMPERATURE,
        max_tokens: NORMALIZER_MAX_TOKENS,
    };
    // The control set rides along as a pseudo-source so its labels land in
    // the same canonical space, without ever being counted by the ranker.
    let outcome = normalize_lists(&normalizer_params, parsed, control_set).await?;

    let mut by_category: BTreeMap<Category, Vec<SourceList>> = Category::ALL
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();
    for list in outcome.lists {
        by_category.entry(list.category).or_default().push(list);
    }

    let deduped = dedupe_categories(by_category);

    let discovered: HashSet<String> = deduped
        .values()
        .flatten()
        .flat_map(|list| list.items.iter())
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    let mut rankings = BTreeMap::new();
    let mut source_latencies = BTreeMap::new();
    for (category, lists) in &deduped {
        let ranking = ranker::rank(lists, config.short_list_size_for(*category));
        source_latencies.extend(ranking.source_latencies.clone());
        rankings.insert(*category, ranking.entities);
    }

    let metrics = if config.test_mode && !control_set.is_empty() {
        Some(evaluate_report(
            control_set,
            &rankings,
            &discovered,
            &deduped,
            &outcome.map,
        ))
    } else {
        None
    };

    Ok(AnalysisReport {
        company_name: request.company_name.clone(),
        rankings,
        source_latencies,
        lists: deduped,
        normalization_map: outcome.map,
        discovered,
        control_set: control_set.to_vec(),
        metrics,
        failed_sources,
    })
}

/// Re-rank an existing report over a caller-supplied subset of sources. The
/// previous report is left untouched; a fresh one comes back, metrics
/// recomputed when a control set was in play.
pub fn recalculate_report(
    report: &AnalysisReport,
    retained_sources: &HashSet<String>,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let mut recalculated = report.clone();
    recalculated.rankings = BTreeMap::new();
    recalculated.source_latencies = BTreeMap::new();

    let mut any_retained = false;
    for (category, lists) in &report.lists {
        match ranker::recalculate(lists, retained_sources, config.short_list_size_for(*category)) {
            Ok(ranking) => {
                any_retained = true;
                recalculated
                    .source_latencies
                    .extend(ranking.source_latencies.clone());
                recalculated.rankings.insert(*category, ranking.entities);
            }
            // A category whose lists all came from excluded sources simply
            // ends up empty; only a globally empty retention is fatal.
            Err(AnalysisError::Recalculation) => {
                recalculated.rankings.insert(*category, Vec::new());
            }
            Err(e) => return Err(e),
        }
    }
    if retained_sources.is_empty() || !any_retained {
        return Err(AnalysisError::Recalculation);
    }

    recalculated.lists = report
        .lists
        .iter()
        .map(|(category, lists)| {
            let retained: Vec<SourceList> = lists
                .iter()
                .filter(|list| retained_sources.contains(&list.source_id))
                .cloned()
                .collect();
            (*category, retained)
        })
        .collect();

    recalculated.discovered = recalculated
        .lists
        .values()
        .flatten()
        .flat_map(|list| list.items.iter())
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if report.metrics.is_some() {
        recalculated.metrics = Some(evaluate_report(
            &report.control_set,
            &recalculated.rankings,
            &recalculated.discovered,
            &recalculated.lists,
            &report.normalization_map,
        ));
    }

    Ok(recalculated)
}

fn evaluate_report(
    control_set: &[String],
    rankings: &BTreeMap<Category, Vec<RankedEntity>>,
    discovered: &HashSet<String>,
    lists: &BTreeMap<Category, Vec<SourceList>>,
    map: &NormalizationMap,
) -> EvaluationMetrics {
    // Post-dedup, an entity lives in exactly one category, so concatenating
    // the per-category short lists never double counts.
    let combined_short_list: Vec<RankedEntity> =
        rankings.values().flatten().cloned().collect();
    let all_lists: Vec<SourceList> = lists.values().flatten().cloned().collect();

    evaluator::evaluate(control_set, &combined_short_list, discovered, &all_lists, map)
}

/// Generate a short factual description for a company the user did not
/// describe, reusing the same completion contract as the fan-out queries.
pub async fn describe_company(client: &LLMClient, company_name: &str) -> Result<String> {
    let params = LLMParams {
        llm_client: client.clone(),
        model: WRITER_MODEL.to_string(),
        temperature: QUERY_TEMPERATURE,
        max_tokens: QUERY_MAX_TOKENS,
    };
    let description =
        generate_llm_response(&prompt::company_description_prompt(company_name), &params).await?;
    Ok(description.trim().to_string())
}

/// Generate the free-form narrative report for a finished analysis.
pub async fn generate_report(
    client: &LLMClient,
    request: &AnalysisRequest,
    report: &AnalysisReport,
) -> Result<String> {
    let params = LLMParams {
        llm_client: client.clone(),
        model: WRITER_MODEL.to_string(),
        temperature: QUERY_TEMPERATURE,
        max_tokens: NORMALIZER_MAX_TOKENS,
    };
    let prompt = prompt::report_prompt(
        &request.company_name,
        &request.company_description,
        &report.rankings,
    );
    generate_llm_response(&prompt, &params).await
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

    fn report_fixture() -> AnalysisReport {
        let mut lists = BTreeMap::new();
        lists.insert(
            Category::Incumbent,
            vec![
                list("a", Category::Incumbent, &["Uber", "Lyft"]),
                list("b", Category::Incumbent, &["Uber"]),
            ],
        );
        lists.insert(
            Category::Regional,
            vec![list("b", Category::Regional, &["Grab"])],
        );

        let mut rankings = BTreeMap::new();
        rankings.insert(
            Category::Incumbent,
            vec![RankedEntity {
                rank: 1,
                label: "Uber".to_string(),
                frequency: 2,
                sources: vec!["a".to_string(), "b".to_string()],
            }],
        );

        AnalysisReport {
            company_name: "Bolt".to_string(),
            rankings,
            source_latencies: BTreeMap::new(),
            lists,
            normalization_map: NormalizationMap::default(),
            discovered: ["Uber", "Lyft", "Grab"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            control_set: Vec::new(),
            metrics: None,
            failed_sources: Vec::new(),
        }
    }

    #[test]
    fn test_recalculate_discards_excluded_sources() {
        let report = report_fixture();
        let retained: HashSet<String> = ["a".to_string()].into_iter().collect();

        let recalculated =
            recalculate_report(&report, &retained, &AnalysisConfig::default()).unwrap();

        let incumbents = &recalculated.rankings[&Category::Incumbent];
        assert_eq!(incumbents.len(), 2);
        assert!(incumbents.iter().all(|entity| entity.frequency == 1));
        // Source b's regional list is gone entirely.
        assert!(recalculated.rankings[&Category::Regional].is_empty());
        assert!(!recalculated.discovered.contains("Grab"));
    }

    #[test]
    fn test_recalculate_with_everything_filtered_fails() {
        let report = report_fixture();
        assert!(matches!(
            recalculate_report(&report, &HashSet::new(), &AnalysisConfig::default()),
            Err(AnalysisError::Recalculation)
        ));

        let unknown: HashSet<String> = ["zz".to_string()].into_iter().collect();
        assert!(matches!(
            recalculate_report(&report, &unknown, &AnalysisConfig::default()),
            Err(AnalysisError::Recalculation)
        ));
    }

    #[test]
    fn test_recalculate_recomputes_metrics_when_control_set_present() {
        let mut report = report_fixture();
        report.control_set = vec!["Uber".to_string()];
        report.metrics = Some(EvaluationMetrics::default());

        let retained: HashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        let recalculated =
            recalculate_report(&report, &retained, &AnalysisConfig::default()).unwrap();

        let metrics = recalculated.metrics.unwrap();
        assert_eq!(metrics.recall, 1.0);
        assert!(metrics.precision > 0.0);
    }
}
