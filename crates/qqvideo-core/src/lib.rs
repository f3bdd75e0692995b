//! QQVideo Resolver Core Library
//!
//! Resolves public v.qq.com page/cover URLs into a structured description
//! of a title (movie or series), its episodes, and the downloadable
//! media-segment URLs per quality tier.
//!
//! # Overview
//!
//! This crate provides the full extraction pipeline:
//! - URL classification for the four known page shapes
//! - Cover/episode extraction from script-embedded JSON payloads
//! - Two per-episode resolvers covering the site's incompatible delivery
//!   APIs (segmented transport streams and keyed single-file formats)
//! - An assembler merging per-quality download URL lists into one record
//!
//! # Example
//!
//! ```no_run
//! use qqvideo_core::{QQVideoScraper, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scraper = QQVideoScraper::new()?;
//!
//!     let record = scraper
//!         .resolve_url("https://v.qq.com/x/cover/nhtfh14i9y1egge.html", None)
//!         .await?;
//!
//!     if let Some(record) = record {
//!         for episode in &record.episodes {
//!             for (quality, bundles) in &episode.downloads {
//!                 println!("ep{} {}: {} bundle(s)", episode.episode_number, quality, bundles.len());
//!             }
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Mirrors
//!
//! Every segment URL comes with its full mirror set, ordered with the
//! operator's own edge servers first. Mirrors are fallbacks for the same
//! content and belong to one download attempt; do not split them.
//!
//! **Important:** keyed-API URLs carry a signed `vkey` parameter and stop
//! working when it expires. Do not cache them long-term.

mod client;
mod error;
pub mod parser;
mod resolver;
mod scraper;
mod types;
pub mod url;

// Re-export client types
pub use client::{ClientConfig, QQVideoClient, UserTokens};

// Re-export error types
pub use error::{QQVideoError, Result};

// Re-export resolver types
pub use resolver::{ResolvedStream, VideoResolver};

// Re-export main scraper API
pub use scraper::{QQVideoScraper, ScraperConfig};

// Re-export data types
pub use types::{
    EpisodeRange, EpisodeRangeSet, EpisodeStub, FormatBundle, MirroredUrl, Platform,
    QualityLabel, TitleRecord, VideoType,
};

// Re-export URL helpers for convenience
pub use url::{UrlKind, classify, cover_url, is_supported_url};
