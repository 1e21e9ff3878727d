use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use textvec::{CountVectorizer, TfidfVectorizer, VectorizerParams};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "textvec")]
#[command(about = "Vectorize documents into count or TF-IDF feature matrices", long_about = None)]
struct Cli {
    /// Document to vectorize (if not provided, reads from stdin)
    #[arg(value_name = "TEXT")]
    text: Option<String>,

    /// Read a single document from file
    #[arg(short, long, value_name = "PATH", conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Batch process documents (one per line)
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["text", "file"])]
    batch: Option<PathBuf>,

    /// Batch process from a JSON array; null or non-string entries are
    /// treated as empty documents instead of aborting the batch
    #[arg(long, value_name = "PATH", conflicts_with_all = ["text", "file", "batch"])]
    batch_json: Option<PathBuf>,

    /// Corpus to fit the vocabulary on (one document per line)
    #[arg(long, value_name = "PATH")]
    fit: Option<PathBuf>,

    /// Load a previously saved vectorizer instead of fitting
    #[arg(long, value_name = "PATH", conflicts_with = "fit")]
    load_model: Option<PathBuf>,

    /// Save the fitted vectorizer for later reuse
    #[arg(long, value_name = "PATH")]
    save_model: Option<PathBuf>,

    /// Weighting mode
    #[arg(short, long, value_enum, default_value = "tfidf")]
    mode: Mode,

    /// Minimum document frequency (fraction in [0,1), or absolute count >= 1)
    #[arg(long, default_value_t = 1.0)]
    min_df: f64,

    /// Maximum document frequency (fraction in (0,1], or absolute count > 1)
    #[arg(long, default_value_t = 1.0)]
    max_df: f64,

    /// Shortest n-gram length
    #[arg(long, default_value_t = 1)]
    ngram_min: usize,

    /// Longest n-gram length
    #[arg(long, default_value_t = 1)]
    ngram_max: usize,

    /// Cap on vocabulary size (most frequent tokens kept)
    #[arg(long)]
    max_features: Option<usize>,

    /// Stop-word list (one token per line)
    #[arg(long, value_name = "PATH")]
    stop_words: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Number of terms per document for the top-terms format
    #[arg(short = 'k', long, default_value_t = 10)]
    top_k: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Raw term counts
    Count,
    /// Smoothed TF-IDF weights with L2-normalized rows
    Tfidf,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    /// Feature labels plus dense rows as a JSON object (default)
    Json,
    /// Dense rows, one document per line
    Dense,
    /// Dominant terms per document (TF-IDF mode only)
    TopTerms,
}

enum Vectorizer {
    Count(CountVectorizer),
    Tfidf(TfidfVectorizer),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let documents = read_documents(&cli)?;
    let vectorizer = build_vectorizer(&cli)?;

    if let Some(path) = &cli.save_model {
        let bytes = match &vectorizer {
            Vectorizer::Count(v) => v.to_bytes()?,
            Vectorizer::Tfidf(v) => v.to_bytes()?,
        };
        fs::write(path, bytes)
            .with_context(|| format!("Failed to write model to {}", path.display()))?;
    }

    output_matrix(&vectorizer, &documents, &cli)
}

/// Determine input documents from CLI args.
/// Priority: text arg > file > batch > batch_json > stdin.
fn read_documents(cli: &Cli) -> Result<Vec<String>> {
    use std::io::Read;

    if let Some(text) = &cli.text {
        return Ok(vec![text.clone()]);
    }

    if let Some(path) = &cli.file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        return Ok(vec![text]);
    }

    if let Some(path) = &cli.batch {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        return Ok(contents.lines().map(String::from).collect());
    }

    if let Some(path) = &cli.batch_json {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON batch file: {}", path.display()))?;
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&contents).with_context(|| "Failed to parse JSON array")?;
        // A malformed entry becomes an empty document (zero tokens) so one
        // bad row never aborts the whole batch
        return Ok(values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(text) => text,
                _ => String::new(),
            })
            .collect());
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(vec![buffer])
}

fn build_params(cli: &Cli) -> Result<VectorizerParams> {
    let mut params = VectorizerParams::new((cli.ngram_min, cli.ngram_max), cli.min_df, cli.max_df);
    if let Some(max_features) = cli.max_features {
        params = params.with_max_features(max_features);
    }
    if let Some(path) = &cli.stop_words {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read stop-word list: {}", path.display()))?;
        params = params.with_stop_words(contents.lines().map(str::trim).filter(|l| !l.is_empty()));
    }
    Ok(params)
}

fn build_vectorizer(cli: &Cli) -> Result<Vectorizer> {
    if let Some(path) = &cli.load_model {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read model from {}", path.display()))?;
        return Ok(match cli.mode {
            Mode::Count => Vectorizer::Count(
                CountVectorizer::from_bytes(&bytes).context("Failed to decode count vectorizer")?,
            ),
            Mode::Tfidf => Vectorizer::Tfidf(
                TfidfVectorizer::from_bytes(&bytes).context("Failed to decode TF-IDF vectorizer")?,
            ),
        });
    }

    let Some(path) = &cli.fit else {
        bail!("either --fit or --load-model is required");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fit corpus: {}", path.display()))?;
    let corpus: Vec<&str> = contents.lines().collect();
    let params = build_params(cli)?;

    Ok(match cli.mode {
        Mode::Count => Vectorizer::Count(
            CountVectorizer::fit(&corpus, params).context("Failed to fit count vectorizer")?,
        ),
        Mode::Tfidf => Vectorizer::Tfidf(
            TfidfVectorizer::fit(&corpus, params).context("Failed to fit TF-IDF vectorizer")?,
        ),
    })
}

fn output_matrix(vectorizer: &Vectorizer, documents: &[String], cli: &Cli) -> Result<()> {
    let (matrix, labels) = match vectorizer {
        Vectorizer::Count(v) => (v.transform(documents), v.feature_labels("Counts_")),
        Vectorizer::Tfidf(v) => (v.transform(documents), v.feature_labels("TFIDF_")),
    };

    let dense_rows = || -> Vec<Vec<f64>> {
        matrix
            .outer_iterator()
            .map(|row| {
                let mut values = vec![0.0; matrix.cols()];
                for (col_idx, &value) in row.iter() {
                    values[col_idx] = value;
                }
                values
            })
            .collect()
    };

    match cli.format {
        OutputFormat::Json => {
            let json_output = serde_json::json!({
                "labels": labels,
                "rows": dense_rows(),
            });
            println!("{}", serde_json::to_string(&json_output)?);
        }
        OutputFormat::Dense => {
            for row in dense_rows() {
                let line = row
                    .iter()
                    .map(|value| format!("{value:.6}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
            }
        }
        OutputFormat::TopTerms => {
            let Vectorizer::Tfidf(v) = vectorizer else {
                bail!("top-terms output requires --mode tfidf");
            };
            for (doc_idx, row) in matrix.outer_iterator().enumerate() {
                let terms = v
                    .top_terms(row, cli.top_k)
                    .into_iter()
                    .map(|(token, weight)| format!("{token}={weight:.4}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("doc {doc_idx}: {terms}");
            }
        }
    }
    Ok(())
}
