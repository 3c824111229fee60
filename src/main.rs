use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use reelmatch::config::{Config, Overrides};
use reelmatch::mcp::{self, ServerContext};
use reelmatch::model::rank::Scored;
use reelmatch::model::Model;
use reelmatch::poster::{HttpPosterSource, Poster, PosterSource};

#[derive(Parser)]
#[command(name = "reelmatch", version, about = "Find titles like the one you just watched")]
struct Cli {
    /// Project root holding .reelmatch/config.toml and the dataset
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
    /// Explicit config file (overrides <root>/.reelmatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Dataset CSV (overrides the config)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,
    /// Weighting mode: count or tfidf (overrides the config)
    #[arg(long, global = true)]
    weighting: Option<String>,
    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend titles similar to the given one
    Recommend {
        /// Exact catalog title
        title: String,
        /// Number of recommendations (default from config)
        #[arg(short)]
        n: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Write a PNG thumbnail per recommendation into this directory
        #[arg(long)]
        posters: Option<PathBuf>,
    },
    /// List catalog titles
    Titles {
        /// Case-insensitive substring filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show model statistics
    Info,
    /// Write a default config file
    Init,
    /// Serve recommendations as JSON-RPC over stdio
    Serve,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let overrides = Overrides {
        dataset: cli.dataset.clone(),
        weighting: cli.weighting.clone(),
    };
    Config::resolve(&cli.root, cli.config.as_deref(), &overrides)
}

fn build_model(root: &Path, config: &Config) -> Result<Model> {
    Model::from_config(root, config).context("building model")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Init => {
            let path = Config::default().save(&cli.root)?;
            println!("Wrote {}", path.display());
        }
        Commands::Info => {
            let config = load_config(&cli)?;
            let model = build_model(&cli.root, &config)?;
            let stats = model.stats();
            println!("dataset:     {}", config.dataset_path(&cli.root).display());
            println!("items:       {}", stats.items);
            println!("vocabulary:  {}", stats.vocabulary_size);
            println!("non-zeros:   {}", stats.nonzero_entries);
            println!("weighting:   {}", stats.weighting);
            if let Some(fingerprint) = &stats.dataset_fingerprint {
                println!("fingerprint: {fingerprint}");
            }
            println!("built:       {} ({} ms)", stats.built_at.to_rfc3339(), stats.build_millis);
        }
        Commands::Titles { filter } => {
            let config = load_config(&cli)?;
            let model = build_model(&cli.root, &config)?;
            let catalog = model.catalog();
            let titles = match filter {
                Some(f) => catalog.suggest(f, usize::MAX),
                None => catalog.titles(),
            };
            for title in titles {
                println!("{title}");
            }
        }
        Commands::Recommend {
            title,
            n,
            json,
            posters,
        } => {
            let config = load_config(&cli)?;
            let model = build_model(&cli.root, &config)?;
            let n = n.unwrap_or(config.query.default_n);
            let recs = model.recommend(title, n)?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&recs)?);
            } else if recs.is_empty() {
                println!("No recommendations found.");
                let suggestions = model.catalog().suggest(title, 5);
                if !suggestions.is_empty() {
                    println!("Did you mean: {}?", suggestions.join(", "));
                }
            } else {
                print_table(&recs);
            }

            if let Some(dir) = posters {
                let source = HttpPosterSource::new(&config.poster);
                write_posters(&source, &recs, dir)?;
            }
        }
        Commands::Serve => {
            let config = load_config(&cli)?;
            let model = build_model(&cli.root, &config)?;
            let posters = HttpPosterSource::new(&config.poster);
            let ctx = ServerContext::new(&model, &posters, config.query.default_n);
            let stdin = std::io::stdin();
            mcp::server::run(stdin.lock(), std::io::stdout(), &ctx)?;
        }
    }

    Ok(())
}

fn print_table(recs: &[Scored]) {
    for (rank, rec) in recs.iter().enumerate() {
        println!(
            "{:>2}. {:<40} {:<28} {:>4.1}  {:.4}",
            rank + 1,
            rec.item.title,
            rec.item.genre,
            rec.item.rating,
            rec.score
        );
    }
}

fn write_posters(source: &dyn PosterSource, recs: &[Scored], dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (rank, rec) in recs.iter().enumerate() {
        match source.enhance(&rec.item.poster) {
            Poster::Present(thumb) => {
                let path = dir.join(format!("{:02}-{}.png", rank + 1, file_stem(&rec.item.title)));
                thumb.save_png(&path)?;
                println!("poster: {}", path.display());
            }
            Poster::Absent(_) => println!("poster unavailable: {}", rec.item.title),
        }
    }
    Ok(())
}

/// Title reduced to characters that are safe in a file name.
fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    stem.trim_matches('-').to_string()
}
