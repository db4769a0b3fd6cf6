//! Command-line demo for the material pipeline.
//!
//! Loads a JSON array of material documents into an in-memory store, runs the
//! pipeline against it, applies the requested view parameters, and prints the
//! resulting list.
//!
//! ```text
//! material-tracker [key=value ...] [documents.json]
//!
//!   config=<file>        TOML configuration (otherwise built from the pairs)
//!   color=<c>            toggle a color filter, repeatable as color=a,b
//!   category=<c>         toggle a category filter, same syntax
//!   metal=yes|no         restrict to metal or non-metal
//!   sort=<column>        color, weight, metal or category; repeat to cycle
//!   unit=g|kg|lb         display unit, persisted for the next run
//!   scope=all|filtered   which collection the statistics describe
//!   width=<cols>         output width, default 80
//! ```

use material_tracker::infrastructure::expand_tilde;
use material_tracker::observability::init_tracing;
use material_tracker::pipeline::{ConnectionState, MetalFilter, SortColumn, StatsScope};
use material_tracker::preferences::JsonPreferences;
use material_tracker::remote::{decode_documents, InMemoryStore};
use material_tracker::ui::render_plain;
use material_tracker::worker::{spawn_pipeline, StaticConfirmation};
use material_tracker::{Config, Result, TrackerError, UnitType};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::time::Instant;

const DEFAULT_WIDTH: usize = 80;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("material-tracker: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let mut settings = BTreeMap::new();
    let mut sorts = Vec::new();
    let mut documents = None;

    for arg in std::env::args().skip(1) {
        match arg.split_once('=') {
            Some(("sort", column)) => sorts.push(parse_column(column)?),
            Some((key, value)) => {
                settings.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => documents = Some(PathBuf::from(arg)),
        }
    }

    let config = match settings.get("config") {
        Some(path) => Config::from_file(expand_tilde(path))?,
        None => Config::from_map(&settings),
    };
    init_tracing(&config);

    let store = Arc::new(InMemoryStore::new());
    if let Some(path) = documents {
        let json = std::fs::read_to_string(&path)?;
        store.seed(&config.collection_name, decode_documents(&json)?).await;
    }
    let prefs = Arc::new(JsonPreferences::new(config.preferences_path())?);

    let handle = spawn_pipeline(&config, store, prefs, Arc::new(StaticConfirmation(false))).await?;
    handle.wait_for(|view| view.connection != ConnectionState::Loading).await?;

    for color in list(settings.get("color")) {
        handle.toggle_color(color).await?;
    }
    for category in list(settings.get("category")) {
        handle.toggle_category(category).await?;
    }
    if let Some(metal) = settings.get("metal") {
        handle.set_metal(parse_metal(metal)?).await?;
    }
    for column in sorts {
        handle.sort_by(column).await?;
    }
    if let Some(scope) = settings.get("scope") {
        handle.set_stats_scope(parse_scope(scope)?).await?;
    }
    if let Some(unit) = settings.get("unit") {
        let unit: UnitType = unit.parse()?;
        handle.set_unit(unit).await?;
    }

    let width = settings
        .get("width")
        .and_then(|w| w.parse().ok())
        .unwrap_or(DEFAULT_WIDTH);
    let view = handle.view();
    print!("{}", render_plain(&view.compute_viewmodel(Instant::now()), width));

    handle.shutdown().await
}

fn list(raw: Option<&String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_column(raw: &str) -> Result<SortColumn> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "color" => Ok(SortColumn::Color),
        "weight" => Ok(SortColumn::Weight),
        "metal" => Ok(SortColumn::Metal),
        "category" => Ok(SortColumn::Category),
        other => Err(TrackerError::Config(format!("unknown sort column: {other}"))),
    }
}

fn parse_metal(raw: &str) -> Result<MetalFilter> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" => Ok(MetalFilter::Metal),
        "no" | "false" => Ok(MetalFilter::NonMetal),
        "any" | "all" => Ok(MetalFilter::All),
        other => Err(TrackerError::Config(format!("unknown metal filter: {other}"))),
    }
}

fn parse_scope(raw: &str) -> Result<StatsScope> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "all" => Ok(StatsScope::All),
        "filtered" => Ok(StatsScope::Filtered),
        other => Err(TrackerError::Config(format!("unknown statistics scope: {other}"))),
    }
}
