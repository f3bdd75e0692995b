//! High-level resolver API for v.qq.com
//!
//! Ties the pipeline together: classify the input URL, fetch the cover
//! page, extract the episode list, optionally narrow it, then drive the
//! per-episode resolver across every quality tier. Everything runs
//! strictly in order; total latency is proportional to network round
//! trips.

use std::sync::Arc;

use tracing::debug;

use crate::client::{ClientConfig, QQVideoClient, UserTokens};
use crate::error::Result;
use crate::parser::{
    default_cover_id, extract_cover_payload, extract_video_info_payload, parse_cover_payload,
};
use crate::resolver::VideoResolver;
use crate::types::{EpisodeRangeSet, FormatBundle, Platform, QualityLabel, TitleRecord};
use crate::url::{UrlKind, classify, cover_url};

/// Configuration for a resolver session
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub client: ClientConfig,
    /// Prefer the logo-free segmented delivery (platform 10801) over the
    /// keyed single-file API (platform 11)
    pub no_logo: bool,
    /// Caller-supplied cookie sets; the elevated one wins when non-empty
    pub tokens: UserTokens,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            no_logo: true,
            tokens: UserTokens::default(),
        }
    }
}

/// Main resolver API for v.qq.com
///
/// One instance is one session: the delivery platform is fixed at
/// construction from the `no_logo` preference and every episode resolved
/// through this instance uses it.
///
/// # Example
/// ```no_run
/// use qqvideo_core::{QQVideoScraper, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let scraper = QQVideoScraper::new()?;
///     let record = scraper
///         .resolve_url("https://v.qq.com/x/cover/nhtfh14i9y1egge.html", None)
///         .await?;
///     if let Some(record) = record {
///         println!("{} ({}): {} episodes", record.title, record.year, record.episodes.len());
///     }
///     Ok(())
/// }
/// ```
pub struct QQVideoScraper {
    client: Arc<QQVideoClient>,
    resolver: VideoResolver,
}

impl QQVideoScraper {
    /// Creates a scraper with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ScraperConfig::default())
    }

    /// Creates a scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let client = Arc::new(QQVideoClient::with_config(config.client)?);
        let platform = if config.no_logo {
            Platform::P10801
        } else {
            Platform::P10901
        };
        let resolver = VideoResolver::new(Arc::clone(&client), config.tokens, platform);
        Ok(Self { client, resolver })
    }

    /// Overrides the info/key API origin, e.g. to point at a mock server
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.resolver = self.resolver.with_api_base(base);
        self
    }

    /// The delivery platform this session resolves through
    pub fn platform(&self) -> Platform {
        self.resolver.platform()
    }

    /// Fetches a cover page and extracts the title record
    ///
    /// One page fetch, then two extraction strategies: the bounded
    /// `COVER_INFO` block first; when that fails, or parses to a record
    /// with no episodes, the alternate `VIDEO_INFO` payload (over the
    /// remainder of the page, or the whole page respectively) decides the
    /// outcome.
    pub async fn fetch_title(&self, cover_url: &str) -> Result<Option<TitleRecord>> {
        let Some(page) = self.client.get_text(cover_url, &[], None).await? else {
            return Ok(None);
        };

        if let Some((raw, end)) = extract_cover_payload(&page)
            && let Some(record) = parse_cover_payload(raw, default_cover_id)
        {
            if !record.episodes.is_empty() {
                return Ok(Some(record));
            }
            // the cover block listed no episodes; whatever the alternate
            // payload yields replaces it outright
            debug!(cover_url, "cover block has no episodes, trying alternate payload");
            return Ok(extract_video_info_payload(&page[end..])
                .and_then(|raw| parse_cover_payload(raw, default_cover_id)));
        }

        Ok(extract_video_info_payload(&page)
            .and_then(|raw| parse_cover_payload(raw, default_cover_id)))
    }

    /// Resolves any supported URL shape into a title record
    ///
    /// Detail/episode/page URLs are re-dispatched through the canonical
    /// cover URL derived from their tokens; episode and page shapes then
    /// narrow the episode list to the single matching video id.
    /// Unsupported URLs yield `Ok(None)` without any fetch.
    pub async fn get_title_info(&self, url: &str) -> Result<Option<TitleRecord>> {
        match classify(url) {
            UrlKind::Cover { .. } => self.fetch_title(url).await,
            UrlKind::Detail { cover_id } => self.fetch_title(&cover_url(&cover_id)).await,
            UrlKind::Episode { cover_id, video_id } => {
                let mut record = self.fetch_title(&cover_url(&cover_id)).await?;
                if let Some(record) = record.as_mut() {
                    record.retain_video_id(&video_id);
                }
                Ok(record)
            }
            UrlKind::Page { video_id } => {
                let mut record = self.fetch_title(url).await?;
                if let Some(record) = record.as_mut() {
                    record.retain_video_id(&video_id);
                }
                Ok(record)
            }
            UrlKind::NoMatch => Ok(None),
        }
    }

    /// Fills in download info for every episode of a title
    ///
    /// Walks episodes in order and quality tiers in enumeration order,
    /// appending a format bundle for each tier the session's resolver
    /// produces. Tiers that fail to resolve are silently omitted; partial
    /// results are the accepted outcome.
    pub async fn attach_downloads(&self, record: &mut TitleRecord) -> Result<()> {
        for episode in &mut record.episodes {
            for quality in QualityLabel::ALL {
                if let Some(stream) = self.resolver.resolve(&episode.video_id, quality).await? {
                    episode
                        .downloads
                        .entry(stream.name)
                        .or_default()
                        .push(FormatBundle {
                            ext: stream.ext,
                            urls: stream.urls,
                        });
                }
            }
        }
        Ok(())
    }

    /// Full pipeline: URL in, download-ready title record out
    ///
    /// Applies the episode range filter (when one is supplied and
    /// non-empty) before download resolution, so filtered-out episodes
    /// cost no network round trips.
    pub async fn resolve_url(
        &self,
        url: &str,
        episodes: Option<&EpisodeRangeSet>,
    ) -> Result<Option<TitleRecord>> {
        let Some(mut record) = self.get_title_info(url).await? else {
            return Ok(None);
        };
        if let Some(ranges) = episodes
            && !ranges.is_empty()
        {
            record.retain_episodes(ranges);
        }
        self.attach_downloads(&mut record).await?;
        Ok(Some(record))
    }
}
