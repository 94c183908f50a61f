mod display;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use normindex_service::{LegalTextService, Settings};
use normindex_store::TextFilter;

#[derive(Parser)]
#[command(
    name = "normindex",
    version,
    about = "Import German statutory texts and search them by citation or meaning"
)]
struct Cli {
    /// DuckDB database file.
    #[arg(long, env = "NORMINDEX_DB", default_value = "normindex.duckdb", global = true)]
    db: PathBuf,

    /// Base URL of the statute/catalog site.
    #[arg(
        long,
        env = "NORMINDEX_GII_BASE_URL",
        default_value = normindex_sync::GII_BASE_URL,
        global = true
    )]
    gii_base_url: String,

    /// Base URL of the Ollama-compatible embedding service.
    #[arg(
        long,
        env = "NORMINDEX_EMBED_URL",
        default_value = "http://localhost:11434",
        global = true
    )]
    embed_base_url: String,

    /// Embedding model name.
    #[arg(
        long,
        env = "NORMINDEX_EMBED_MODEL",
        default_value = normindex_ai::DEFAULT_MODEL,
        global = true
    )]
    embed_model: String,

    /// Bearer token for the embedding service.
    #[arg(long, env = "NORMINDEX_EMBED_TOKEN", global = true)]
    embed_token: Option<String>,

    /// Embedding dimension; must match the database and the model.
    #[arg(
        long,
        env = "NORMINDEX_EMBED_DIM",
        default_value_t = normindex_ai::DEFAULT_DIMENSION,
        global = true
    )]
    embed_dimension: usize,

    /// Texts per embedding request.
    #[arg(long, env = "NORMINDEX_EMBED_BATCH", default_value_t = 50, global = true)]
    embed_batch_size: usize,

    /// Print results as JSON instead of cards.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import one or more legal codes from the remote source.
    Import {
        /// Code identifiers, e.g. `bgb stgb alttzg_1996`.
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Query stored texts by exact citation.
    Query {
        code: String,
        /// Section designation, e.g. '§ 1' or 'Art 3'.
        #[arg(long)]
        section: Option<String>,
        /// Sub-section number; requires --section.
        #[arg(long = "sub-section")]
        sub_section: Option<String>,
    },
    /// Semantic search within one imported code.
    Search {
        code: String,
        query: String,
        /// Maximum number of results.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Maximum cosine distance (0-2); results further away are dropped.
        #[arg(short, long, default_value_t = 0.7)]
        cutoff: f32,
    },
    /// List imported codes with their stored unit counts.
    Codes,
    /// List importable codes from the remote catalog.
    Catalog {
        /// Show at most this many entries.
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let settings = Settings {
        db_path: cli.db,
        gii_base_url: cli.gii_base_url,
        embed_base_url: cli.embed_base_url,
        embed_model: cli.embed_model,
        embed_auth_token: cli.embed_token,
        embed_dimension: cli.embed_dimension,
        embed_batch_size: cli.embed_batch_size,
    };
    let service = LegalTextService::from_settings(&settings)
        .with_context(|| format!("opening store at {}", settings.db_path.display()))?;

    match cli.command {
        Command::Import { codes } => {
            let mut reports = Vec::new();
            for code in &codes {
                let report = service
                    .import(code)
                    .await
                    .with_context(|| format!("importing '{code}'"))?;
                if !cli.json {
                    println!(
                        "imported {} unit(s) for {}",
                        report.units_imported, report.code
                    );
                }
                reports.push(report);
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
        Command::Query {
            code,
            section,
            sub_section,
        } => {
            let filter = TextFilter {
                code: Some(code),
                section,
                sub_section,
            };
            let units = service.lookup(&filter)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&units)?);
            } else {
                display::print_units(&units);
            }
        }
        Command::Search {
            code,
            query,
            limit,
            cutoff,
        } => {
            let hits = service.search(&code, &query, limit, Some(cutoff)).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else {
                display::print_hits(&query, &hits);
            }
        }
        Command::Codes => {
            let codes = service.codes_with_counts()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&codes)?);
            } else {
                display::print_codes(&codes);
            }
        }
        Command::Catalog { limit } => {
            let entries = service.catalog().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*entries)?);
            } else {
                display::print_catalog(&entries, limit);
            }
        }
    }

    Ok(())
}
