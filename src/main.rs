use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use authorship_analyzer::corpus::{CorpusSource, DirectorySource, GutenbergSource, SplitStrategy};
use authorship_analyzer::{Pipeline, PipelineConfig};

/// Authorship classification, collocation mining and topic modeling over
/// two public-domain books.
#[derive(Parser)]
#[command(name = "authorship-analyzer", version, about)]
struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read `<dir>/<id>.txt` instead of downloading
    #[arg(long)]
    corpus_dir: Option<PathBuf>,

    /// The two corpus ids, e.g. `--ids 1342,84`
    #[arg(long, value_delimiter = ',')]
    ids: Option<Vec<u32>>,

    /// Seed of the train/test permutation
    #[arg(long)]
    seed: Option<u64>,

    /// Share of documents held out for testing
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Cross-validation folds
    #[arg(long)]
    folds: Option<usize>,

    /// LDA topic count
    #[arg(long)]
    topics: Option<usize>,

    /// Also write the report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.corpus_dir {
            config.corpus.dir = Some(dir.clone());
        }
        if let Some(ids) = &self.ids {
            config.corpus.ids = ids.clone();
        }
        if let Some(seed) = self.seed {
            config.split.seed = seed;
            config.topic.lda.seed = seed;
        }
        if let Some(test_fraction) = self.test_fraction {
            config.split.strategy = SplitStrategy::Fraction { test_fraction };
        }
        if let Some(folds) = self.folds {
            config.classifier.folds = folds;
        }
        if let Some(topics) = self.topics {
            config.topic.lda.n_topics = topics;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("authorship_analyzer=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    let corpus = &pipeline.config().corpus;
    let source: Box<dyn CorpusSource> = match &corpus.dir {
        Some(dir) => {
            info!(dir = %dir.display(), "reading corpora from directory");
            Box::new(DirectorySource::new(dir))
        }
        None => Box::new(GutenbergSource::new(corpus).context("Failed to build HTTP client")?),
    };

    let report = pipeline.run(source.as_ref()).context("Pipeline failed")?;
    println!("{report}");

    if let Some(path) = &cli.report_json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}
