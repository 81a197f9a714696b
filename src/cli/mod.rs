mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::{Client, redirect};
use tracing::{info, warn};

use crate::bulk::{self, BulkRequest};
use crate::store::KeywordStore;
use crate::suggest::{Source, SuggestClient, SuggestionSource};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Parser)]
#[command(name = "longtail", version, about = "Keyword suggestion harvester for Google, Amazon, and YouTube")]
pub struct Cli {
    /// Store file to use instead of the platform default.
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch suggestions for a single query.
    Suggest(SuggestArgs),
    /// Expand a query with a-z and 0-9 suffixes and fetch them all.
    Bulk(BulkArgs),
    /// List saved keywords, or remove some.
    Saved(SavedArgs),
    /// Show recent searches.
    History,
    /// Write saved keywords to a JSON file.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct SuggestArgs {
    query: String,

    /// Source to query, or `all` for every source at once.
    #[arg(long, value_enum, default_value_t = SourceChoice::Google)]
    source: SourceChoice,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Save the fetched suggestions to the store.
    #[arg(long)]
    save: bool,
}

#[derive(Debug, Args)]
struct BulkArgs {
    query: String,

    #[arg(long, value_enum, default_value_t = Source::Google)]
    source: Source,

    /// Requests sent concurrently per batch.
    #[arg(long, default_value_t = bulk::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Pause between batches, in milliseconds.
    #[arg(long, default_value_t = bulk::DEFAULT_INTER_BATCH_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Save the aggregated suggestions to the store.
    #[arg(long)]
    save: bool,
}

#[derive(Debug, Args)]
struct SavedArgs {
    /// Remove saved keywords with this exact text.
    #[arg(long, value_name = "TEXT")]
    remove: Option<String>,

    /// Restrict --remove to a single source.
    #[arg(long, value_enum, requires = "remove")]
    source: Option<Source>,

    /// Remove every saved keyword.
    #[arg(long, conflicts_with = "remove")]
    clear: bool,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Output path.
    #[arg(long, default_value = "saved-keywords.json")]
    out: PathBuf,
}

/// `Source` plus the fan-out pseudo-source accepted by `suggest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceChoice {
    Google,
    Amazon,
    Youtube,
    All,
}

impl SourceChoice {
    fn single(self) -> Option<Source> {
        match self {
            SourceChoice::Google => Some(Source::Google),
            SourceChoice::Amazon => Some(Source::Amazon),
            SourceChoice::Youtube => Some(Source::Youtube),
            SourceChoice::All => None,
        }
    }
}

impl std::fmt::Display for SourceChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceChoice::Google => "google",
            SourceChoice::Amazon => "amazon",
            SourceChoice::Youtube => "youtube",
            SourceChoice::All => "all",
        };
        f.write_str(name)
    }
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;
    let client = SuggestClient::new(http);

    let store_path = cli.store.unwrap_or_else(KeywordStore::default_path);
    let mut store = KeywordStore::open(store_path)?;

    match cli.command {
        Command::Suggest(args) => suggest(&client, &mut store, args).await,
        Command::Bulk(args) => bulk_run(&client, &mut store, args).await,
        Command::Saved(args) => saved(&mut store, args),
        Command::History => {
            print!("{}", output::history_list(store.history()));
            Ok(())
        }
        Command::Export(args) => export(&store, &args.out),
    }
}

async fn suggest(
    client: &SuggestClient,
    store: &mut KeywordStore,
    args: SuggestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = args.query.trim();
    if query.is_empty() {
        return Err("query must not be empty".into());
    }

    info!(query = %query, source = %args.source, "fetching suggestions");

    match args.source.single() {
        Some(source) => {
            let suggestions = client.suggestions(source, query).await?;
            store.record_search(query, source.as_str())?;
            if args.save {
                let added =
                    store.save_all(suggestions.iter().map(|text| (text.as_str(), source)))?;
                info!(added, "keywords saved");
            }
            if args.json {
                println!("{}", output::suggestion_set_json(query, source, &suggestions)?);
            } else {
                print!("{}", output::suggestion_list(query, source, &suggestions));
            }
        }
        None => {
            let groups = client.all_suggestions(query).await;
            store.record_search(query, "all")?;
            if args.save {
                let added = store.save_all(groups.iter().flat_map(|(source, suggestions)| {
                    suggestions.iter().map(|text| (text.as_str(), *source))
                }))?;
                info!(added, "keywords saved");
            }
            if args.json {
                println!("{}", output::grouped_json(query, &groups)?);
            } else {
                print!("{}", output::grouped_suggestions(query, &groups));
            }
        }
    }
    Ok(())
}

async fn bulk_run(
    client: &SuggestClient,
    store: &mut KeywordStore,
    args: BulkArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = args.query.trim();
    let request = BulkRequest {
        batch_size: args.batch_size,
        inter_batch_delay: Duration::from_millis(args.delay_ms),
        ..BulkRequest::new(query, args.source)
    };

    info!(
        query = %query,
        source = %args.source,
        batch_size = args.batch_size,
        "starting bulk run"
    );

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested, stopping after the current batch");
            flag.store(true, Ordering::Relaxed);
        }
    });

    let result = bulk::run(
        client,
        &request,
        |progress| info!(completed = progress.completed, total = progress.total, "batch done"),
        || cancel.load(Ordering::Relaxed),
    )
    .await?;

    store.record_bulk_search(query, args.source.as_str())?;
    if args.save {
        let added = store.save_all(
            result
                .suggestions
                .iter()
                .map(|item| (item.text.as_str(), item.source)),
        )?;
        info!(added, "keywords saved");
    }

    if args.json {
        println!("{}", output::bulk_json(&result.suggestions)?);
    } else {
        print!("{}", output::bulk_summary(&result, query, args.source));
    }
    Ok(())
}

fn saved(store: &mut KeywordStore, args: SavedArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.clear {
        let removed = store.clear_saved()?;
        println!("Removed {removed} saved keywords.");
        return Ok(());
    }
    if let Some(text) = &args.remove {
        let removed = store.remove(text, args.source)?;
        println!("Removed {removed} saved keywords.");
        return Ok(());
    }
    print!("{}", output::saved_list(store.saved()));
    Ok(())
}

fn export(store: &KeywordStore, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(store.saved())?;
    std::fs::write(out, json)?;
    println!("Exported {} keywords to {}", store.saved().len(), out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bulk_flags_parse() {
        let cli = Cli::try_parse_from([
            "longtail", "bulk", "shoe", "--source", "amazon", "--batch-size", "3",
            "--delay-ms", "0", "--json",
        ])
        .unwrap();
        let Command::Bulk(args) = cli.command else {
            panic!("expected bulk");
        };
        assert_eq!(args.query, "shoe");
        assert_eq!(args.source, Source::Amazon);
        assert_eq!(args.batch_size, 3);
        assert_eq!(args.delay_ms, 0);
        assert!(args.json);
        assert!(!args.save);
    }

    #[test]
    fn bulk_defaults_match_pacing_constants() {
        let cli = Cli::try_parse_from(["longtail", "bulk", "shoe"]).unwrap();
        let Command::Bulk(args) = cli.command else {
            panic!("expected bulk");
        };
        assert_eq!(args.source, Source::Google);
        assert_eq!(args.batch_size, bulk::DEFAULT_BATCH_SIZE);
        assert_eq!(
            Duration::from_millis(args.delay_ms),
            bulk::DEFAULT_INTER_BATCH_DELAY
        );
    }

    #[test]
    fn suggest_accepts_the_all_pseudo_source() {
        let cli =
            Cli::try_parse_from(["longtail", "suggest", "shoe", "--source", "all"]).unwrap();
        let Command::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        assert_eq!(args.source, SourceChoice::All);
        assert_eq!(args.source.single(), None);
    }

    #[test]
    fn saved_clear_conflicts_with_remove() {
        let result = Cli::try_parse_from([
            "longtail", "saved", "--clear", "--remove", "shoes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn saved_source_requires_remove() {
        let result = Cli::try_parse_from(["longtail", "saved", "--source", "google"]);
        assert!(result.is_err());
    }

    #[test]
    fn store_flag_is_global() {
        let cli = Cli::try_parse_from([
            "longtail", "history", "--store", "/tmp/store.json",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/store.json")));
    }
}
