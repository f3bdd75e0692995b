//! Debug script to resolve a cover URL end to end
//!
//! Run with: cargo run --example resolve_url -p qqvideo-core -- <url>

use qqvideo_core::{QQVideoScraper, is_supported_url};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://v.qq.com/x/cover/nhtfh14i9y1egge.html".to_string());

    if !is_supported_url(&url) {
        println!("Unsupported URL: {}", url);
        return Ok(());
    }

    let scraper = QQVideoScraper::new()?;

    println!("Resolving {}...\n", url);

    match scraper.resolve_url(&url, None).await? {
        Some(record) => {
            println!(
                "{} ({}) [{:?}]: {} episode(s)\n",
                record.title,
                record.year,
                record.video_type,
                record.episodes.len()
            );

            for episode in &record.episodes {
                println!("ep{:02} {}", episode.episode_number, episode.video_id);
                for (quality, bundles) in &episode.downloads {
                    for bundle in bundles {
                        println!(
                            "  {} ({}): {} segment(s)",
                            quality,
                            bundle.ext,
                            bundle.urls.len()
                        );
                        if let Some(first) = bundle.urls.first().and_then(|u| u.primary()) {
                            println!("    first: {}", first);
                        }
                    }
                }
            }
        }
        None => println!("No title information found"),
    }

    Ok(())
}
