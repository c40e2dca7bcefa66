//! Spam Screen
//!
//! Serves a fitted TF-IDF vectorizer and naive Bayes classifier behind a
//! small HTML form: paste a message, get its predicted label and probability.

mod classifier;
mod config;
mod error;
mod handlers;
mod inference;
mod models;
mod server;
mod store;
mod templates;
mod vectorizer;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use config::ServerConfig;
use store::ModelStore;

#[derive(Parser, Debug)]
#[command(name = "spam-screen")]
#[command(about = "Web front end for a fitted spam/ham text classifier", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, env = "SPAM_SCREEN_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short = 'l', long)]
    host: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Fitted vectorizer artifact
    #[arg(long)]
    vectorizer: Option<PathBuf>,

    /// Fitted classifier artifact
    #[arg(long)]
    classifier: Option<PathBuf>,

    /// Load and validate the artifacts, then exit without serving
    #[arg(long)]
    check: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ServerConfig::load(&cli)?;

    info!(
        vectorizer = %config.vectorizer_path.display(),
        classifier = %config.classifier_path.display(),
        "loading model artifacts"
    );
    let models = ModelStore::load(&config.vectorizer_path, &config.classifier_path)
        .context("cannot serve predictions without valid model artifacts")?;

    if cli.check {
        println!(
            "ok: {} features, classes {:?}",
            models.vectorizer.n_features(),
            models.classifier.classes()
        );
        return Ok(());
    }

    server::run(config, Arc::new(models))
        .await
        .context("server failed")
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("spam_screen=debug,actix_web=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("spam_screen=info,actix_web=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
