//! Core data types for the v.qq.com resolver
//!
//! The extraction pipeline produces a fresh [`TitleRecord`] tree per call:
//! a title owns its episode stubs, each stub owns the per-quality format
//! bundles attached during download resolution. Nothing in the tree is
//! shared or cached across calls.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream delivery platform identifier
///
/// The two incompatible info APIs the site still runs side by side.
/// `P10801` serves segmented transport streams (the "no logo" variant),
/// `P10901` serves single-file formats that need one signed key per chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    P10801,
    P10901,
}

impl Platform {
    /// Value of the `platform` query parameter for this API
    pub fn as_param(&self) -> &'static str {
        match self {
            Platform::P10801 => "10801",
            Platform::P10901 => "11",
        }
    }
}

/// Request-time quality tier, ordered best-first
///
/// Wire names (`fhd`/`shd`/`hd`/`sd`) double as the `defn` query parameter
/// and as the serialized map key under [`EpisodeStub::downloads`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityLabel {
    Fhd,
    Shd,
    Hd,
    Sd,
}

impl QualityLabel {
    /// All quality tiers in resolution order, the order the assembler
    /// walks them in
    pub const ALL: [QualityLabel; 4] = [
        QualityLabel::Fhd,
        QualityLabel::Shd,
        QualityLabel::Hd,
        QualityLabel::Sd,
    ];

    /// Upstream wire name used in `defn` parameters and format names
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLabel::Fhd => "fhd",
            QualityLabel::Shd => "shd",
            QualityLabel::Hd => "hd",
            QualityLabel::Sd => "sd",
        }
    }

    /// Numeric resolution code advertised by the segmented-stream API
    pub fn resolution(&self) -> u64 {
        match self {
            QualityLabel::Fhd => 1080,
            QualityLabel::Shd => 720,
            QualityLabel::Hd => 480,
            QualityLabel::Sd => 270,
        }
    }

    /// Fallback format id when the info response omits one
    pub fn fallback_format_id(&self, platform: Platform) -> u64 {
        match platform {
            Platform::P10901 => match self {
                QualityLabel::Fhd => 10209,
                QualityLabel::Shd => 10201,
                QualityLabel::Hd => 10212,
                QualityLabel::Sd => 10203,
            },
            Platform::P10801 => match self {
                QualityLabel::Fhd => 321004,
                QualityLabel::Shd => 321003,
                QualityLabel::Hd => 321002,
                QualityLabel::Sd => 321001,
            },
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title kind as the upstream site models it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    Movie,
    Tv,
}

impl VideoType {
    /// Maps the upstream numeric type code; unknown codes fall back to movie
    pub fn from_type_code(code: i64) -> Self {
        match code {
            2 | 3 => VideoType::Tv,
            _ => VideoType::Movie,
        }
    }
}

/// One logical media segment reachable via interchangeable origin URLs
///
/// Mirrors serve byte-identical content and are ordered primary-origin
/// first. They belong together as fallbacks for a single download attempt
/// and must never be split into separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredUrl {
    pub mirrors: Vec<String>,
}

impl MirroredUrl {
    pub fn new(mirrors: Vec<String>) -> Self {
        Self { mirrors }
    }

    /// Preferred origin for this segment, if any mirror is known
    pub fn primary(&self) -> Option<&str> {
        self.mirrors.first().map(String::as_str)
    }
}

/// All segments of one container format at one quality tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatBundle {
    /// Normalized container extension, `ts` or `mp4`
    pub ext: String,
    /// Ordered segment list; each entry carries its own mirror set
    pub urls: Vec<MirroredUrl>,
}

/// One episode of a title, with download info filled in lazily
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeStub {
    /// Opaque per-episode token used in all downstream API calls
    pub video_id: String,
    /// 1-based position within the title
    pub episode_number: u32,
    /// Per-quality download bundles, keyed in quality order
    #[serde(default)]
    pub downloads: BTreeMap<QualityLabel, Vec<FormatBundle>>,
}

impl EpisodeStub {
    pub fn new(video_id: impl Into<String>, episode_number: u32) -> Self {
        Self {
            video_id: video_id.into(),
            episode_number,
            downloads: BTreeMap::new(),
        }
    }
}

/// A title (movie or series) with its ordered episode list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
    /// Release year; `"1900"` when the upstream payload has none
    pub year: String,
    /// Upstream cover id, or a synthesized `random_`-prefixed token
    pub cover_id: String,
    pub video_type: VideoType,
    pub episodes: Vec<EpisodeStub>,
}

impl TitleRecord {
    /// Keeps only the episode with the given video id
    ///
    /// Used when the input URL names a single episode within a cover.
    pub fn retain_video_id(&mut self, video_id: &str) {
        self.episodes.retain(|ep| ep.video_id == video_id);
    }

    /// Keeps only episodes whose number falls in the given range set
    pub fn retain_episodes(&mut self, ranges: &EpisodeRangeSet) {
        self.episodes.retain(|ep| ranges.contains(ep.episode_number));
    }
}

/// One element of an episode selection: a single number or an inclusive span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeRange {
    Single(u32),
    Span(u32, u32),
}

/// Ordered set of episode numbers and inclusive ranges
///
/// The per-URL episode filter applied before download resolution, e.g.
/// `{1, 3-5}` keeps episodes 1, 3, 4 and 5.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeRangeSet {
    ranges: Vec<EpisodeRange>,
}

impl EpisodeRangeSet {
    pub fn new(ranges: Vec<EpisodeRange>) -> Self {
        Self { ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, episode: u32) -> bool {
        self.ranges.iter().any(|range| match *range {
            EpisodeRange::Single(n) => episode == n,
            EpisodeRange::Span(lo, hi) => lo <= episode && episode <= hi,
        })
    }
}

impl FromIterator<EpisodeRange> for EpisodeRangeSet {
    fn from_iter<I: IntoIterator<Item = EpisodeRange>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_quality_order_best_first() {
        assert_eq!(
            QualityLabel::ALL,
            [
                QualityLabel::Fhd,
                QualityLabel::Shd,
                QualityLabel::Hd,
                QualityLabel::Sd
            ]
        );
        assert!(QualityLabel::Fhd < QualityLabel::Sd);
    }

    #[test]
    fn test_quality_fallback_format_ids() {
        assert_eq!(
            QualityLabel::Fhd.fallback_format_id(Platform::P10901),
            10209
        );
        assert_eq!(
            QualityLabel::Sd.fallback_format_id(Platform::P10801),
            321001
        );
    }

    #[test]
    fn test_video_type_from_code() {
        assert_eq!(VideoType::from_type_code(1), VideoType::Movie);
        assert_eq!(VideoType::from_type_code(2), VideoType::Tv);
        assert_eq!(VideoType::from_type_code(3), VideoType::Tv);
        assert_eq!(VideoType::from_type_code(0), VideoType::Movie);
        assert_eq!(VideoType::from_type_code(99), VideoType::Movie);
    }

    #[test]
    fn test_range_set_membership() {
        let set = EpisodeRangeSet::new(vec![
            EpisodeRange::Single(1),
            EpisodeRange::Span(3, 5),
        ]);

        let kept: Vec<u32> = (1..=6).filter(|&ep| set.contains(ep)).collect();
        assert_eq!(kept, vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_retain_episodes() {
        let mut record = TitleRecord {
            title: "t".to_string(),
            year: "1989".to_string(),
            cover_id: "nhtfh14i9y1egge".to_string(),
            video_type: VideoType::Tv,
            episodes: (1..=6)
                .map(|n| EpisodeStub::new(format!("v{n}"), n))
                .collect(),
        };
        let set = EpisodeRangeSet::new(vec![
            EpisodeRange::Single(1),
            EpisodeRange::Span(3, 5),
        ]);

        record.retain_episodes(&set);

        let numbers: Vec<u32> = record.episodes.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_retain_video_id() {
        let mut record = TitleRecord {
            title: "t".to_string(),
            year: "1900".to_string(),
            cover_id: "c".to_string(),
            video_type: VideoType::Tv,
            episodes: vec![
                EpisodeStub::new("d00249ld45q", 1),
                EpisodeStub::new("q0024a27g9j", 2),
            ],
        };

        record.retain_video_id("q0024a27g9j");

        assert_eq!(record.episodes.len(), 1);
        assert_eq!(record.episodes[0].video_id, "q0024a27g9j");
        assert_eq!(record.episodes[0].episode_number, 2);
    }

    #[test]
    fn test_title_record_serialization_round_trip() {
        let mut stub = EpisodeStub::new("d00249ld45q", 1);
        stub.downloads.insert(
            QualityLabel::Hd,
            vec![FormatBundle {
                ext: "ts".to_string(),
                urls: vec![MirroredUrl::new(vec![
                    "https://a.tc.qq.com/x.1.ts".to_string(),
                    "https://b.other.com/x.1.ts".to_string(),
                ])],
            }],
        );
        let record = TitleRecord {
            title: "李师师".to_string(),
            year: "1989".to_string(),
            cover_id: "nhtfh14i9y1egge".to_string(),
            video_type: VideoType::Tv,
            episodes: vec![stub],
        };

        let json = serde_json::to_string(&record).expect("serialize");
        assert!(json.contains("\"hd\""));
        let back: TitleRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(record, back);
    }

    proptest! {
        #[test]
        fn prop_span_membership_matches_bounds(lo in 1u32..50, len in 0u32..10, ep in 0u32..80) {
            let hi = lo + len;
            let set = EpisodeRangeSet::new(vec![EpisodeRange::Span(lo, hi)]);
            prop_assert_eq!(set.contains(ep), lo <= ep && ep <= hi);
        }

        #[test]
        fn prop_empty_set_contains_nothing(ep in 0u32..1000) {
            prop_assert!(!EpisodeRangeSet::default().contains(ep));
        }
    }
}
