//! Manga Reader - chapter inspection CLI
//!
//! Resolves a chapter route against the configured API and prints the
//! assembled page sequence.

use std::env;
use std::sync::Arc;

use manga_reader::content::ChapterSource;
use manga_reader::network::{ApiClient, StaticToken};
use manga_reader::{ChapterKey, ReaderConfig, Result, NAME, VERSION};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(route) = args.get(1) else {
        eprintln!("usage: manga-reader <chapter-route>   (e.g. 42 or ext-abc123)");
        std::process::exit(2);
    };

    if let Err(e) = run(route).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(route: &str) -> Result<()> {
    let config = ReaderConfig::from_env()?;
    let chapter = ChapterKey::from_route(route)?;

    let mut client = ApiClient::from_config(&config)?;
    if let Ok(token) = env::var("READER_API_TOKEN") {
        client = client.with_credentials(Arc::new(StaticToken::new(token)));
    }

    println!("📖 {} v{} - chapter {}", NAME, VERSION, chapter);
    let content = client.fetch_chapter(&chapter).await?;
    let pages = content.pages()?;

    println!("{} pages", pages.len());
    for page in &pages {
        println!(
            "  #{:<4} {:<12} {}",
            page.ordinal,
            page.id.to_string(),
            page.image.resolve(&config.api_base_url)?
        );
    }

    let adjacent = content.adjacent();
    if let Some(previous) = adjacent.previous {
        println!("← previous: {}", previous);
    }
    if let Some(next) = adjacent.next {
        println!("→ next: {}", next);
    }
    Ok(())
}
