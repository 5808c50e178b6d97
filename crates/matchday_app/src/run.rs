use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use matchday_engine::{
    decode_html, discover_match_links, parse_match_list, redact_proxy, BatchRunner, DatasetLabel,
    ExportError, Exporter, MatchAssembler, MatchLink, MatchTarget, ReqwestFetcher, RetryingFetcher,
};
use matchday_logging::{md_error, md_info, md_warn};

use crate::cli::ScrapeArgs;
use crate::config::{ConfigError, ScrapeConfig};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read match input {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("no matches scraped")]
    NothingScraped,
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::NothingScraped => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }
}

/// File config first, then flags, then `${ENV}` resolution and validation.
pub fn build_config(args: &ScrapeArgs) -> Result<ScrapeConfig, ConfigError> {
    let base = match &args.config {
        Some(path) => ScrapeConfig::load(path)?,
        None => ScrapeConfig::default(),
    };
    let config = args.apply(base).resolve_env()?;
    config.validate()?;
    Ok(config)
}

pub fn load_targets(args: &ScrapeArgs, config: &ScrapeConfig) -> Result<Vec<MatchTarget>, AppError> {
    let links: Vec<MatchLink> = if let Some(path) = &args.matches {
        parse_match_list(&read_input(path)?)
    } else if let Some(path) = &args.listing {
        discover_match_links(&read_input(path)?, &args.base_url)
    } else {
        Vec::new()
    };
    Ok(links
        .into_iter()
        .map(|link| link.into_target(&config.country, &config.league, config.season_label()))
        .collect())
}

fn read_input(path: &Path) -> Result<String, AppError> {
    let bytes = fs::read(path).map_err(|source| AppError::Input {
        path: path.display().to_string(),
        source,
    })?;
    Ok(decode_html(&bytes, None).html)
}

pub async fn scrape(args: ScrapeArgs) -> Result<(), AppError> {
    let config = build_config(&args)?;
    md_info!(
        "Country: {} | League: {} | Season: {} | Output: {:?} ({})",
        config.country,
        config.league,
        config.season_label(),
        config.output_dir,
        config.output_format
    );
    if let Some(proxy) = config.proxy_url.as_deref() {
        md_info!("Proxy: {}", redact_proxy(proxy));
    }

    let targets = load_targets(&args, &config)?;
    md_info!("Found {} matches", targets.len());
    if targets.is_empty() {
        md_error!("No matches found in the given input");
        return Err(AppError::NothingScraped);
    }

    let fetcher = Arc::new(RetryingFetcher::new(
        ReqwestFetcher::new(config.fetch_settings()),
        config.retry_settings(),
    ));
    let assembler = Arc::new(MatchAssembler::new(fetcher, config.assembly_options()));
    let exporter = Exporter::new(config.output_dir.clone());
    let runner = BatchRunner::new(assembler, config.runner_settings())
        .with_checkpoints(exporter.clone());

    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            md_warn!("interrupt received, finishing in-flight matches");
            cancel.cancel();
        }
    });

    let outcome = runner.run(targets).await;
    println!("{}", outcome.summary);
    if outcome.matches.is_empty() {
        md_error!("No matches scraped successfully");
        return Err(AppError::NothingScraped);
    }
    if !outcome.failed.is_empty() {
        md_warn!("Failed: {} matches", outcome.failed.len());
    }

    if outcome.export_requested {
        let label = DatasetLabel {
            country: config.country.clone(),
            league: config.league.clone(),
            season: config.season_label().to_string(),
        };
        let summary = exporter.export(&outcome.matches, &label, config.output_format, Utc::now())?;
        println!("Data saved to: {}", summary.path.display());
    }
    Ok(())
}
