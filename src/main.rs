use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use trail_topics::{
    Analysis, ClusterModel, CorpusSource, CsvCorpusSource, KMeansConfig, NmfConfig, PipelineConfig, StopWords,
    TopicModel,
};

/// Trail Topics: cluster trail descriptions and extract their topics.
#[derive(Parser)]
#[command(name = "trail-topics", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// CSV with a header row and a lemmatized text column
    #[arg(long)]
    input: PathBuf,

    /// Column holding the lemmatized text
    #[arg(long, default_value = "lemmatized_text")]
    text_column: String,

    /// Column holding the document id (default: row number)
    #[arg(long)]
    id_column: Option<String>,

    /// Stopword file, one word per line
    #[arg(long)]
    stopwords: Option<PathBuf>,

    /// JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write the full analysis as CBOR
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition documents with k-means
    Cluster {
        #[command(flatten)]
        input: Input,

        /// Number of clusters (overrides the config file)
        #[arg(long, short = 'k')]
        clusters: Option<usize>,
    },

    /// Extract soft topics with NMF
    Topics {
        #[command(flatten)]
        input: Input,

        /// Number of topics (overrides the config file)
        #[arg(long, short = 'n')]
        topics: Option<usize>,
    },

    /// Print a saved analysis
    Show {
        /// CBOR file written with --save
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster { input, clusters } => {
            let mut config = load_config(&input)?;
            if let Some(k) = clusters {
                let mut section = config.clustering.take().unwrap_or_else(|| KMeansConfig::new(k));
                section.n_clusters = k;
                config.clustering = Some(section);
            }
            if let (Some(seed), Some(section)) = (input.seed, config.clustering.as_mut()) {
                section.seed = Some(seed);
            }
            if config.clustering.is_none() {
                anyhow::bail!("no cluster count: pass --clusters or add a \"clustering\" section to the config");
            }
            config.topics = None;

            let analysis = run(&input, &config)?;
            if let Some(model) = &analysis.clusters {
                print_clusters(&analysis.ids, model);
            }
            save(&input, &analysis)?;
        }

        Commands::Topics { input, topics } => {
            let mut config = load_config(&input)?;
            if let Some(n) = topics {
                let mut section = config.topics.take().unwrap_or_else(|| NmfConfig::new(n));
                section.n_topics = n;
                config.topics = Some(section);
            }
            if let (Some(seed), Some(section)) = (input.seed, config.topics.as_mut()) {
                section.seed = Some(seed);
            }
            if config.topics.is_none() {
                anyhow::bail!("no topic count: pass --topics or add a \"topics\" section to the config");
            }
            config.clustering = None;

            let analysis = run(&input, &config)?;
            if let Some(model) = &analysis.topics {
                print_topics(&analysis.ids, model);
            }
            save(&input, &analysis)?;
        }

        Commands::Show { path } => {
            let file = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
            let analysis = Analysis::from_cbor_reader(BufReader::new(file))
                .with_context(|| format!("reading analysis from {}", path.display()))?;
            println!(
                "{} documents, {} terms",
                analysis.space.n_docs(),
                analysis.space.vocabulary.len()
            );
            if let Some(model) = &analysis.clusters {
                print_clusters(&analysis.ids, model);
            }
            if let Some(model) = &analysis.topics {
                print_topics(&analysis.ids, model);
            }
        }
    }

    Ok(())
}

fn load_config(input: &Input) -> Result<PipelineConfig> {
    match &input.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_stop_words(path: Option<&Path>) -> Result<StopWords> {
    match path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening stopwords {}", path.display()))?;
            let words = StopWords::from_reader(BufReader::new(file))?;
            info!(count = words.len(), "Loaded stopwords");
            Ok(words)
        }
        None => Ok(StopWords::new()),
    }
}

fn run(input: &Input, config: &PipelineConfig) -> Result<Analysis> {
    let mut source = CsvCorpusSource::new(&input.input).with_lemmatized_column(&input.text_column);
    if let Some(id) = &input.id_column {
        source = source.with_id_column(id);
    }
    let corpus = source
        .load()
        .with_context(|| format!("loading corpus {}", input.input.display()))?;
    let stop_words = load_stop_words(input.stopwords.as_deref())?;
    Ok(Analysis::run(&corpus, &stop_words, config)?)
}

fn save(input: &Input, analysis: &Analysis) -> Result<()> {
    if let Some(path) = &input.save {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        analysis.to_cbor_writer(BufWriter::new(file))?;
        info!(path = %path.display(), "Saved analysis");
    }
    Ok(())
}

fn print_clusters(ids: &[String], model: &ClusterModel) {
    if !model.converged {
        println!("warning: k-means stopped at the iteration cap");
    }
    for (cluster, size) in model.cluster_sizes().into_iter().enumerate() {
        println!("cluster {cluster} ({size} documents): {}", model.top_words[cluster].join(", "));
    }
    for (id, label) in ids.iter().zip(&model.labels) {
        println!("{id}\t{label}");
    }
}

fn print_topics(ids: &[String], model: &TopicModel) {
    if !model.converged {
        println!("warning: NMF stopped at the iteration cap");
    }
    for (topic, words) in model.top_words.iter().enumerate() {
        println!("topic {topic} ({} documents): {}", model.documents_of(topic).len(), words.join(", "));
    }
    for (doc, id) in ids.iter().enumerate() {
        let topics: Vec<String> = model.topics_of(doc).iter().map(usize::to_string).collect();
        println!("{id}\t{}", topics.join(","));
    }
}
