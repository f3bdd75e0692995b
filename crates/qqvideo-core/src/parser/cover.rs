//! Embedded cover/episode payload extraction
//!
//! Cover pages carry their metadata as script-embedded JSON. Two payload
//! shapes exist: a `COVER_INFO` block terminated by the `COLUMN_INFO`
//! marker, and a `VIDEO_INFO`/`"videoInfo"` block used as the fallback.
//! Extraction is pure text work so it stays independent of the fetch layer.

use rand::Rng;
use serde_json::Value;
use tracing::debug;

use crate::types::{EpisodeStub, TitleRecord, VideoType};

const COVER_INFO_PAT: &str = r"(?is)var\s+COVER_INFO\s*=\s*(.+?);?var\s+COLUMN_INFO";
const VIDEO_INFO_PAT: &str =
    r#"(?is)var\s+VIDEO_INFO\s*=\s*(.+?);?</script>|"videoInfo"\s*:\s*(\{.+?\})"#;

/// Locates the `COVER_INFO` payload in raw page text
///
/// Returns the raw JSON fragment and the offset where the match ended, so
/// the caller can run the fallback extraction over the remainder of the
/// page.
pub fn extract_cover_payload(text: &str) -> Option<(&str, usize)> {
    let re = regex::Regex::new(COVER_INFO_PAT).ok()?;
    let caps = re.captures(text)?;
    let end = caps.get(0)?.end();
    Some((caps.get(1)?.as_str(), end))
}

/// Locates the alternate `VIDEO_INFO` payload in raw page text
///
/// Matches either a script-embedded `var VIDEO_INFO = {...}` statement or
/// an inline `"videoInfo": {...}` fragment.
pub fn extract_video_info_payload(text: &str) -> Option<&str> {
    let re = regex::Regex::new(VIDEO_INFO_PAT).ok()?;
    let caps = re.captures(text)?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Parses one extracted payload into a normalized [`TitleRecord`]
///
/// `gen_cover_id` supplies the synthesized cover id when the payload has
/// none; injectable so tests can pin a fixed value. Malformed JSON yields
/// `None`, never an error — the caller falls through to its next strategy.
pub fn parse_cover_payload(
    raw: &str,
    gen_cover_id: impl FnOnce() -> String,
) -> Option<TitleRecord> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!("cover payload is not valid JSON: {e}");
            return None;
        }
    };
    let obj = value.as_object()?;

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| obj.get("c_title_output").and_then(Value::as_str))
        .unwrap_or("")
        .to_string();

    let year = match obj.get("year") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "1900".to_string(),
    };

    let cover_id = match obj.get("cover_id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => gen_cover_id(),
    };

    let mut type_code = obj.get("typeid").and_then(Value::as_i64).unwrap_or(0);
    if type_code == 0 {
        type_code = obj.get("video_type").and_then(Value::as_i64).unwrap_or(0);
    }
    let video_type = VideoType::from_type_code(type_code);

    // Single-episode payloads carry a bare `vid`; series payloads carry the
    // episode list under "nomal_ids" (the upstream field really is spelled
    // that way). Episode numbers are assigned positionally because the
    // returned info may not include them.
    let episodes: Vec<EpisodeStub> = match obj
        .get("vid")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        Some(vid) => vec![EpisodeStub::new(vid, 1)],
        None => obj
            .get("nomal_ids")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|vi| vi.get("V").and_then(Value::as_str))
                    .filter(|v| !v.is_empty())
                    .enumerate()
                    .map(|(idx, vid)| EpisodeStub::new(vid, idx as u32 + 1))
                    .collect()
            })
            .unwrap_or_default(),
    };

    Some(TitleRecord {
        title,
        year,
        cover_id,
        video_type,
        episodes,
    })
}

/// Synthesizes a cover id for payloads that omit one
///
/// Fresh per call, so downstream file/directory naming never collapses
/// different titles onto one identifier.
pub fn default_cover_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let token: String = (0..8)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("random_{token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoType;

    fn fixed_id() -> String {
        "random_test0000".to_string()
    }

    #[test]
    fn test_extract_cover_payload() {
        let page = r#"<script>var COVER_INFO = {"title":"x","cover_id":"abc"};var COLUMN_INFO = {};</script>"#;
        let (raw, end) = extract_cover_payload(page).expect("payload");
        assert_eq!(raw, r#"{"title":"x","cover_id":"abc"}"#);
        assert!(end <= page.len());
        assert!(page[end..].contains("</script>"));
    }

    #[test]
    fn test_extract_cover_payload_missing_marker() {
        let page = r#"var COVER_INFO = {"title":"x"};"#;
        assert!(extract_cover_payload(page).is_none());
    }

    #[test]
    fn test_extract_video_info_payload_script_form() {
        let page = r#"<script>var VIDEO_INFO = {"vid":"d00249ld45q"};</script>"#;
        let raw = extract_video_info_payload(page).expect("payload");
        assert_eq!(raw, r#"{"vid":"d00249ld45q"}"#);
    }

    #[test]
    fn test_extract_video_info_payload_inline_form() {
        let page = r#"window.__DATA__ = {"videoInfo": {"vid":"d00249ld45q"}, "other": 1};"#;
        let raw = extract_video_info_payload(page).expect("payload");
        assert_eq!(raw, r#"{"vid":"d00249ld45q"}"#);
    }

    #[test]
    fn test_parse_cover_payload_series() {
        let raw = r#"{
            "title": "李师师",
            "year": "1989",
            "cover_id": "nhtfh14i9y1egge",
            "typeid": 2,
            "nomal_ids": [
                {"V": "d00249ld45q", "E": 9},
                {"V": "q0024a27g9j", "E": 3}
            ]
        }"#;

        let record = parse_cover_payload(raw, fixed_id).expect("record");
        assert_eq!(record.title, "李师师");
        assert_eq!(record.year, "1989");
        assert_eq!(record.cover_id, "nhtfh14i9y1egge");
        assert_eq!(record.video_type, VideoType::Tv);
        // upstream numbering is overwritten positionally
        let numbers: Vec<u32> = record.episodes.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(record.episodes[0].video_id, "d00249ld45q");
        assert_eq!(record.episodes[1].video_id, "q0024a27g9j");
    }

    #[test]
    fn test_parse_cover_payload_assigns_numbers_when_absent() {
        let raw = r#"{
            "title": "t",
            "cover_id": "c",
            "typeid": 2,
            "nomal_ids": [{"V": "v1"}, {"V": "v2"}, {"V": "v3"}]
        }"#;

        let record = parse_cover_payload(raw, fixed_id).expect("record");
        let numbers: Vec<u32> = record.episodes.iter().map(|e| e.episode_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_cover_payload_singular_vid() {
        let raw = r#"{"title": "movie", "typeid": 1, "vid": "d00249ld45q"}"#;

        let record = parse_cover_payload(raw, fixed_id).expect("record");
        assert_eq!(record.video_type, VideoType::Movie);
        assert_eq!(record.episodes.len(), 1);
        assert_eq!(record.episodes[0].video_id, "d00249ld45q");
        assert_eq!(record.episodes[0].episode_number, 1);
        // no cover_id in the payload, so the injected generator kicks in
        assert_eq!(record.cover_id, "random_test0000");
    }

    #[test]
    fn test_parse_cover_payload_title_fallback() {
        let raw = r#"{"title": "", "c_title_output": "fallback", "cover_id": "c"}"#;
        let record = parse_cover_payload(raw, fixed_id).expect("record");
        assert_eq!(record.title, "fallback");
    }

    #[test]
    fn test_parse_cover_payload_year_defaults() {
        let raw = r#"{"title": "t", "cover_id": "c"}"#;
        let record = parse_cover_payload(raw, fixed_id).expect("record");
        assert_eq!(record.year, "1900");
    }

    #[test]
    fn test_parse_cover_payload_type_fallback_field() {
        let raw = r#"{"title": "t", "cover_id": "c", "typeid": 0, "video_type": 3}"#;
        let record = parse_cover_payload(raw, fixed_id).expect("record");
        assert_eq!(record.video_type, VideoType::Tv);
    }

    #[test]
    fn test_parse_cover_payload_unknown_type_is_movie() {
        let raw = r#"{"title": "t", "cover_id": "c", "typeid": 7}"#;
        let record = parse_cover_payload(raw, fixed_id).expect("record");
        assert_eq!(record.video_type, VideoType::Movie);
    }

    #[test]
    fn test_parse_cover_payload_malformed_json() {
        assert!(parse_cover_payload("{not json", fixed_id).is_none());
        assert!(parse_cover_payload("[1, 2, 3]", fixed_id).is_none());
    }

    #[test]
    fn test_default_cover_id_shape() {
        let id = default_cover_id();
        assert!(id.starts_with("random_"));
        let token = &id["random_".len()..];
        assert_eq!(token.len(), 8);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
