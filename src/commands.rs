use anyhow::{Context, Result};
use console::style;
use tracing::info;

use crate::config::{Config, get_config_dir};
use crate::search::{SearchPipeline, SearchResponse};

/// Run one retrieval request and print the results.
#[inline]
pub async fn run_search(
    vector_query: Option<String>,
    keyword_queries: Vec<String>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;
    let pipeline = SearchPipeline::from_config(&config).context("Failed to build pipeline")?;

    let vector_query = vector_query.unwrap_or_default();
    info!(
        "Searching activities (semantic: {:?}, constraints: {:?})",
        vector_query, keyword_queries
    );

    let response = SearchResponse::from(pipeline.find_activities(&vector_query, &keyword_queries).await);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("Failed to serialize response")?
        );
        return Ok(());
    }

    match (response.activities, response.error_message) {
        (Some(activities), _) => {
            if activities.is_empty() {
                println!("{}", style("No matching activities.").yellow());
            }
            for activity in &activities {
                println!(
                    "{}  {} ({}-{} min, {} EUR, kid-friendliness {})",
                    style(&activity.activity_id).dim(),
                    style(&activity.name).bold(),
                    activity.duration_min,
                    activity.duration_max,
                    activity.cost,
                    activity.kid_friendliness_score
                );
                println!("    {}", activity.description);
            }
        }
        (None, Some(error_message)) => {
            println!("{} {}", style("Search failed:").red().bold(), error_message);
        }
        (None, None) => unreachable!("response carries either activities or an error"),
    }

    Ok(())
}

/// Probe the configured backend and report its status.
#[inline]
pub async fn show_health() -> Result<()> {
    let config = load_config()?;
    let pipeline = SearchPipeline::from_config(&config).context("Failed to build pipeline")?;

    match pipeline.connections().acquire().await {
        Ok(handle) => {
            println!(
                "{} backend: {}",
                config.backend,
                style("connected").green().bold()
            );
            if handle.supports_vector_search() {
                println!("vector search: {}", style("available").green());
            } else {
                println!(
                    "vector search: {} (extension not loaded)",
                    style("unavailable").yellow()
                );
            }
        }
        Err(e) => {
            println!(
                "{} backend: {} ({})",
                config.backend,
                style("unreachable").red().bold(),
                e
            );
        }
    }

    Ok(())
}

/// Print the active configuration as TOML.
#[inline]
pub fn show_config() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    Config::load(config_dir)
}
