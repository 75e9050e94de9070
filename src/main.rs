use anyhow::{bail, Context, Result};
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use clap::Parser;
use colored::Colorize;
use ollama_rs::Ollama;
use prettytable::{row, Table};
use std::env;
use tracing::info;

use rivals::analysis::{self, AnalysisRequest};
use rivals::config::{AnalysisConfig, QueryMode};
use rivals::db::Database;
use rivals::environment::{get_env_var_as_vec, get_env_var_or};
use rivals::evaluator::as_percent;
use rivals::logging::configure_logging;
use rivals::progress::{ProgressTracker, QueryStatus};
use rivals::types::Category;
use rivals::{LLMClient, TARGET_PIPELINE};

/// Discover and rank competitors for a company by fanning the question out
/// to a panel of LLMs and aggregating their answers.
#[derive(Parser, Debug)]
#[command(name = "rivals", version)]
struct Args {
    /// Company to analyze.
    company: Option<String>,

    /// Short description of the company; generated when omitted.
    #[arg(long)]
    description: Option<String>,

    /// Pin the regional category to an explicit region (e.g. "Europe").
    #[arg(long)]
    region: Option<String>,

    /// Query the smaller fast-mode model panel.
    #[arg(long)]
    fast: bool,

    /// Comma-separated model identifiers, overriding the panel.
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,

    /// Long-list size requested from each model.
    #[arg(long, default_value_t = 20)]
    long_list: usize,

    /// Short-list size for the primary category.
    #[arg(long, default_value_t = 10)]
    short_list: usize,

    /// Path to a control-set file (one entity per line); enables test mode.
    #[arg(long)]
    control_set: Option<String>,

    /// Also generate a narrative report from the ranked results.
    #[arg(long)]
    report: bool,

    /// SQLite file for the analysis history.
    #[arg(long, default_value = "rivals.db")]
    db_path: String,

    /// List previously analyzed companies and exit.
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();
    let args = Args::parse();

    info!(
        target: TARGET_PIPELINE,
        "rivals {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIMESTAMP")
    );

    let db = Database::new(&args.db_path).await?;

    if args.history {
        print_history(&db).await?;
        return Ok(());
    }

    let Some(company_name) = args.company.clone() else {
        bail!("a company name is required unless --history is given");
    };

    // Credential check happens before any fan-out starts.
    let client = build_client()?;

    let control_set = match &args.control_set {
        Some(path) => read_control_set(path)?,
        None => Vec::new(),
    };

    let mut config = AnalysisConfig {
        long_list_size: args.long_list,
        short_list_size: args.short_list,
        custom_sources: if args.models.is_empty() {
            get_env_var_as_vec("RIVALS_SOURCES", ',')
        } else {
            args.models.clone()
        },
        mode: if args.fast {
            QueryMode::Fast
        } else {
            QueryMode::Deep
        },
        region: args.region.clone(),
        ..Default::default()
    };
    if !control_set.is_empty() {
        config.apply_test_mode(control_set.len());
        println!(
            "Test mode: control set of {} entities, short list {}, long list {}",
            control_set.len(),
            config.short_list_size,
            config.long_list_size
        );
    }

    let description = match &args.description {
        Some(description) => description.clone(),
        None => {
            println!("Generating company description...");
            analysis::describe_company(&client, &company_name).await?
        }
    };
    println!("\n{}\n{}\n", company_name.bold(), description);

    let request = AnalysisRequest {
        company_name: company_name.clone(),
        company_description: description,
    };

    let tracker = ProgressTracker::with_observer(|event| {
        let status = match event.status {
            QueryStatus::Requesting => "requesting...".to_string().yellow(),
            QueryStatus::Success => {
                format!("done in {:.2}s", event.elapsed_seconds).green()
            }
            QueryStatus::Error => {
                format!("failed after {:.2}s", event.elapsed_seconds).red()
            }
        };
        println!("  [{}] {} {}", event.category, event.source_id, status);
    });

    let report = analysis::run_analysis(&client, &config, &request, &control_set, &tracker)
        .await
        .context("analysis failed")?;

    if !report.failed_sources.is_empty() {
        println!(
            "\n{}",
            format!(
                "{} of {} queries failed; results are based on the remaining sources:",
                report.failed_sources.len(),
                config.sources().len() * Category::ALL.len()
            )
            .yellow()
        );
        for (source_id, category, error) in &report.failed_sources {
            println!("  [{}] {}: {}", category, source_id, error);
        }
    }

    for category in Category::ALL {
        let Some(entities) = report.rankings.get(&category) else {
            continue;
        };
        println!("\n{}", format!("{} competitors", category).bold());
        if entities.is_empty() {
            println!("  (none found)");
            continue;
        }

        let mut table = Table::new();
        table.add_row(row!["Rank", "Competitor", "Models", "Named by"]);
        for entity in entities {
            table.add_row(row![
                entity.rank,
                entity.label,
                entity.frequency,
                entity.sources.join(", ")
            ]);
        }
        table.printstd();
    }

    if let Some(metrics) = &report.metrics {
        println!("\n{}", "Control-set evaluation".bold());
        println!("  precision: {}", as_percent(metrics.precision));
        println!("  recall:    {}", as_percent(metrics.recall));

        let mut table = Table::new();
        table.add_row(row!["Model", "Precision", "Recall"]);
        for (source_id, precision) in &metrics.per_source_precision {
            let recall = metrics
                .per_source_recall
                .get(source_id)
                .copied()
                .unwrap_or(0.0);
            table.add_row(row![source_id, as_percent(*precision), as_percent(recall)]);
        }
        table.printstd();
    }

    if args.report {
        println!("\n{}", "Generating report...".bold());
        let narrative = analysis::generate_report(&client, &request, &report).await?;
        println!("\n{}", narrative);
    }

    let short_list: Vec<String> = report
        .rankings
        .get(&Category::Incumbent)
        .map(|entities| entities.iter().map(|e| e.label.clone()).collect())
        .unwrap_or_default();
    db.record_analysis(
        &company_name,
        config.sources().len(),
        &short_list,
        report.metrics.as_ref(),
    )
    .await?;

    Ok(())
}

/// Build the LLM client from the environment. An OpenAI-compatible endpoint
/// (OpenRouter by default) takes precedence; a local Ollama server is the
/// fallback. No credential at all is a fatal precondition.
fn build_client() -> Result<LLMClient> {
    if let Ok(api_key) = env::var("OPENROUTER_API_KEY") {
        let base_url = get_env_var_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1");
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        return Ok(LLMClient::OpenAI(OpenAIClient::with_config(config)));
    }

    if let Ok(host) = env::var("OLLAMA_HOST") {
        let port: u16 = get_env_var_or("OLLAMA_PORT", "11434").parse().unwrap_or(11434);
        return Ok(LLMClient::Ollama(Ollama::new(host, port)));
    }

    bail!("no API credential: set OPENROUTER_API_KEY (or OLLAMA_HOST for a local server)")
}

fn read_control_set(path: &str) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read control set from {}", path))?;
    let entities: Vec<String> = contents
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if entities.is_empty() {
        bail!("control set file {} contains no entities", path);
    }
    Ok(entities)
}

async fn print_history(db: &Database) -> Result<()> {
    let entries = db.list_analyses().await?;
    if entries.is_empty() {
        println!("No previous analyses.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["When", "Company", "Models", "Short list", "Precision", "Recall"]);
    for entry in &entries {
        table.add_row(row![
            entry.analyzed_at,
            entry.company_name,
            entry.source_count,
            entry.short_list.join(", "),
            entry.precision.map(as_percent).unwrap_or_else(|| "-".to_string()),
            entry.recall.map(as_percent).unwrap_or_else(|| "-".to_string())
        ]);
    }
    table.printstd();

    // Session averages over the runs that had a control set.
    let scored: Vec<_> = entries
        .iter()
        .filter_map(|entry| entry.precision.zip(entry.recall))
        .collect();
    if !scored.is_empty() {
        let count = scored.len() as f64;
        let precision = scored.iter().map(|(p, _)| p).sum::<f64>() / count;
        let recall = scored.iter().map(|(_, r)| r).sum::<f64>() / count;
        println!(
            "Average over {} evaluated runs: precision {}, recall {}",
            scored.len(),
            as_percent(precision),
            as_percent(recall)
        );
    }

    Ok(())
}
