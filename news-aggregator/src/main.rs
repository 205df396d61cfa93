use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use interfaces::SqliteStore;
use news_aggregator::config::DATABASE_VAR;
use news_aggregator::{AggregatorConfig, Article, DateRange, Fetcher, FilterCriteria, NewsAggregator, Preferences};
use std::env;
use std::sync::Arc;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "news-aggregator", about = "Fetch, cache and filter news headlines and searches")]
struct Cli {
    /// SQLite file holding the article cache and preferences
    #[arg(long)]
    database: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Top headlines for a country
    Headlines {
        #[arg(long, default_value = "us")]
        country: String,
        /// Only show articles matching the stored preferences
        #[arg(long)]
        preferred: bool,
    },
    /// Keyword search across every category
    Search {
        term: String,
        #[arg(long, default_value = "all")]
        country: String,
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long = "source")]
        sources: Vec<String>,
        /// First publication day to keep (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last publication day to keep (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Also apply the stored preferences
        #[arg(long)]
        preferred: bool,
    },
    /// Show or edit stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    Set {
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long = "source")]
        sources: Vec<String>,
        #[arg(long = "author")]
        authors: Vec<String>,
    },
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let database = cli
        .database
        .clone()
        .or_else(|| env::var(DATABASE_VAR).ok())
        .unwrap_or_else(|| "news-cache.db".to_string());

    let config = AggregatorConfig::from_env();
    if config.fetch.api_key.is_empty() {
        warn!("NEWS_API_KEY is not set; uncached requests will be rejected by the provider");
    }

    info!("Opening cache database: {}", database);
    let store = Arc::new(
        SqliteStore::open(&database)
            .await
            .with_context(|| format!("Failed to open cache database {}", database))?,
    );
    let provider = Arc::new(Fetcher::new(config.fetch.clone())?);
    let aggregator = NewsAggregator::new(provider, store, config);
    aggregator.load_preferences().await;

    match cli.command {
        Command::Headlines { country, preferred } => {
            aggregator.set_current_country(&country).await;
            aggregator.refresh_headlines().await?;
            let articles = if preferred {
                aggregator.preferred_headlines().await
            } else {
                aggregator.state().await.news
            };
            print_articles(&articles);
        }
        Command::Search {
            term,
            country,
            categories,
            sources,
            from,
            to,
            preferred,
        } => {
            aggregator.search(&term, &country).await?;

            let date_range = match (from, to) {
                (None, None) => None,
                (start, end) => Some(DateRange::from_dates(
                    start.unwrap_or(NaiveDate::MIN),
                    end.unwrap_or(NaiveDate::MAX),
                )),
            };
            let criteria = FilterCriteria {
                categories,
                sources,
                date_range,
            };

            let mut articles = aggregator.filtered_search_results(&criteria).await;
            if preferred {
                let preferences = aggregator.state().await.preferences;
                articles = news_aggregator::apply_preferences(&articles, &preferences);
            }
            print_articles(&articles);
        }
        Command::Prefs { action } => match action {
            PrefsAction::Show => print_preferences(&aggregator.state().await.preferences),
            PrefsAction::Set {
                categories,
                sources,
                authors,
            } => {
                let preferences = Preferences::default()
                    .with_categories(categories)
                    .with_sources(sources)
                    .with_authors(authors);
                aggregator.set_preferences(preferences.clone()).await?;
                print_preferences(&preferences);
            }
            PrefsAction::Clear => {
                aggregator.clear_preferences().await?;
                println!("Preferences cleared");
            }
        },
    }

    Ok(())
}

fn print_articles(articles: &[Article]) {
    if articles.is_empty() {
        println!("No articles found.");
        return;
    }

    for article in articles {
        println!("{}", article.title);
        let mut byline = vec![article.source_name().to_string()];
        if let Some(category) = &article.category {
            byline.push(category.clone());
        }
        if let Some(author) = &article.author {
            byline.push(author.clone());
        }
        println!("  {}", byline.join(" | "));
        println!("  {}", article.published_at.format("%Y-%m-%d %H:%M UTC"));
        if !article.url.is_empty() {
            println!("  {}", article.url);
        }
        println!();
    }
    println!("{} articles", articles.len());
}

fn print_preferences(preferences: &Preferences) {
    let show = |label: &str, values: &std::collections::BTreeSet<String>| {
        if values.is_empty() {
            println!("{}: (any)", label);
        } else {
            let joined: Vec<&str> = values.iter().map(String::as_str).collect();
            println!("{}: {}", label, joined.join(", "));
        }
    };
    show("Categories", &preferences.categories);
    show("Sources", &preferences.sources);
    show("Authors", &preferences.authors);
}
