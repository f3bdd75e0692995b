//! Per-episode download URL resolution
//!
//! Two incompatible upstream info APIs are reconciled here. The segmented
//! API (platform `10801`) advertises sequentially numbered transport-stream
//! clips, or an HLS playlist for single-file containers. The keyed API
//! (platform `11`) advertises per-chapter filename templates that each need
//! one signed key fetched before a URL can be built.
//!
//! Both speak the same wrapped-JSON envelope (`QZOutputJson=...;`) and both
//! advertise a set of interchangeable origin prefixes, ordered here so the
//! operator's own edge servers come before third-party mirrors.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::client::{QQVideoClient, UserTokens};
use crate::error::Result;
use crate::parser::parse_segment_names;
use crate::types::{MirroredUrl, Platform, QualityLabel};

const WRAPPER_PREFIX: &str = "QZOutputJson=";
const ORIGIN_DOMAIN: &str = ".tc.qq.com";
const SEGMENTED_API_BASE: &str = "https://vv.video.qq.com";
const KEYED_API_BASE: &str = "https://h5vv.video.qq.com";

/// One successfully resolved quality tier for one episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    /// Format name, always the requested quality label
    pub name: QualityLabel,
    /// Normalized container extension
    pub ext: String,
    /// Ordered segment URLs, one mirror set per segment
    pub urls: Vec<MirroredUrl>,
}

/// Per-episode resolver bound to one delivery platform
///
/// The platform is chosen once per session from the "no logo" preference;
/// every `resolve` call dispatches to the matching API.
pub struct VideoResolver {
    client: Arc<QQVideoClient>,
    tokens: UserTokens,
    platform: Platform,
    api_base: String,
}

impl VideoResolver {
    pub fn new(client: Arc<QQVideoClient>, tokens: UserTokens, platform: Platform) -> Self {
        let api_base = match platform {
            Platform::P10801 => SEGMENTED_API_BASE,
            Platform::P10901 => KEYED_API_BASE,
        };
        Self {
            client,
            tokens,
            platform,
            api_base: api_base.to_string(),
        }
    }

    /// Overrides the info/key API origin, e.g. to point at a mock server
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolves the download URL set for one episode at one quality
    ///
    /// `Ok(None)` covers every no-data outcome: non-200 responses, broken
    /// envelopes, DRM-protected entries, missing format entries and
    /// incomplete chapter sets. Only transport-library failures are errors.
    pub async fn resolve(
        &self,
        video_id: &str,
        quality: QualityLabel,
    ) -> Result<Option<ResolvedStream>> {
        match self.platform {
            Platform::P10801 => self.resolve_segmented(video_id, quality).await,
            Platform::P10901 => self.resolve_keyed(video_id, quality).await,
        }
    }

    /// Fetches an API endpoint and unwraps the JSON envelope
    async fn fetch_wrapped(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>> {
        let url = format!("{}{}", self.api_base, path);
        let Some(text) = self
            .client
            .get_text(&url, params, self.tokens.active())
            .await?
        else {
            return Ok(None);
        };
        let Some(body) = strip_wrapped_json(&text) else {
            debug!(%url, "response missing the QZOutputJson wrapper");
            return Ok(None);
        };
        match serde_json::from_str(body) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(%url, "wrapped payload is not valid JSON: {e}");
                Ok(None)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Segmented-stream API (platform 10801)
    // -----------------------------------------------------------------------

    async fn resolve_segmented(
        &self,
        video_id: &str,
        quality: QualityLabel,
    ) -> Result<Option<ResolvedStream>> {
        let params = [
            ("vid", video_id.to_string()),
            ("defn", quality.as_str().to_string()),
            ("otype", "json".to_string()),
            ("platform", Platform::P10801.as_param().to_string()),
            ("fhdswitch", "1".to_string()),
            ("show1080p", "1".to_string()),
            ("dtype", "3".to_string()),
        ];
        let Some(data) = self.fetch_wrapped("/getinfo", &params).await? else {
            return Ok(None);
        };

        let chosen = order_mirror_prefixes(collect_url_prefixes(&data));

        if !is_drm_free(&data) {
            debug!(video_id, "skipping DRM-protected entry");
            return Ok(None);
        }

        if format_entries(&data)
            .iter()
            .all(|f| f.get("resolution").and_then(Value::as_u64) != Some(quality.resolution()))
        {
            return Ok(None);
        }

        let filename = data
            .pointer("/vl/vi/0/fn")
            .and_then(Value::as_str)
            .unwrap_or("");
        let (stem, ext) = filename.rsplit_once('.').unwrap_or(("", filename));

        let mut urls = Vec::new();
        if ext == "ts" {
            let clip_count = data
                .pointer("/vl/vi/0/fc")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            // clip numbering starts at 0 only when the advertised count is 0,
            // which still yields exactly one clip
            let start = if clip_count == 0 { 0 } else { 1 };
            for idx in start..=clip_count {
                let clip_name = format!("{stem}.{idx}.ts");
                urls.push(MirroredUrl::new(
                    chosen
                        .iter()
                        .map(|prefix| format!("{prefix}{clip_name}"))
                        .collect(),
                ));
            }
            return Ok(Some(ResolvedStream {
                name: quality,
                ext: ext.to_string(),
                urls,
            }));
        }

        // Single-file container: the transport is still segmented ts, and the
        // advertised HLS playlist names the segments.
        let playlist_name = data
            .pointer("/vl/vi/0/ul/ui")
            .and_then(Value::as_array)
            .and_then(|ui| ui.last())
            .and_then(|entry| entry.pointer("/hls/pname"))
            .and_then(Value::as_str);
        if let Some(pname) = playlist_name
            && let Some(last_prefix) = chosen.last()
        {
            let playlist_url = format!("{last_prefix}{pname}");
            if let Some(playlist) = self
                .client
                .get_text(&playlist_url, &[], self.tokens.active())
                .await?
            {
                for segment in parse_segment_names(&playlist) {
                    urls.push(MirroredUrl::new(
                        chosen
                            .iter()
                            .map(|prefix| format!("{prefix}{filename}/{segment}"))
                            .collect(),
                    ));
                }
            } else {
                debug!(video_id, %playlist_url, "playlist fetch failed");
            }
        }

        Ok(Some(ResolvedStream {
            name: quality,
            ext: "ts".to_string(),
            urls,
        }))
    }

    // -----------------------------------------------------------------------
    // Keyed single-file API (platform 11)
    // -----------------------------------------------------------------------

    async fn resolve_keyed(
        &self,
        video_id: &str,
        quality: QualityLabel,
    ) -> Result<Option<ResolvedStream>> {
        let params = [
            ("isHLS", "false".to_string()),
            ("charge", "0".to_string()),
            ("vid", video_id.to_string()),
            ("defn", quality.as_str().to_string()),
            ("defnpayver", "1".to_string()),
            ("otype", "json".to_string()),
            ("platform", Platform::P10901.as_param().to_string()),
            ("sdtfrom", "v1010".to_string()),
            ("host", "v.qq.com".to_string()),
            ("fhdswitch", "0".to_string()),
            ("show1080p", "1".to_string()),
        ];
        let Some(data) = self.fetch_wrapped("/getinfo", &params).await? else {
            return Ok(None);
        };

        let chosen = order_mirror_prefixes(collect_url_prefixes(&data));

        if !is_drm_free(&data) {
            debug!(video_id, "skipping DRM-protected entry");
            return Ok(None);
        }

        let Some(format_info) = format_entries(&data)
            .iter()
            .find(|f| f.get("name").and_then(Value::as_str) == Some(quality.as_str()))
        else {
            return Ok(None);
        };
        let format_id = format_info
            .get("id")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| quality.fallback_format_id(Platform::P10901));

        let filename = data
            .pointer("/vl/vi/0/fn")
            .and_then(Value::as_str)
            .unwrap_or("");
        // base filename must be "<name>.<format>.<ext>"; anything else
        // signals an upstream naming scheme this resolver does not know
        let name_parts: Vec<&str> = filename.split('.').collect();
        if name_parts.len() != 3 {
            debug!(video_id, filename, "unexpected base filename shape");
            return Ok(None);
        }
        let ext = name_parts[2];
        let Some(format_letter) = name_parts[1].chars().next() else {
            return Ok(None);
        };
        let format_segment = format!("{}{}", format_letter, format_id % 10000);

        let mut urls = Vec::new();
        let chapters = data
            .pointer("/vl/vi/0/cl/ci")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for chapter in chapters {
            let keyid = chapter.get("keyid").and_then(Value::as_str).unwrap_or("");
            let mut key_parts: Vec<&str> = keyid.split('.').collect();
            if key_parts.len() != 3 {
                debug!(video_id, keyid, "unexpected key template, stopping chapter walk");
                break;
            }
            key_parts[1] = format_segment.as_str();
            let chapter_filename = format!("{}.{}", key_parts.join("."), ext);

            let key_params = [
                ("otype", "json".to_string()),
                ("vid", video_id.to_string()),
                ("format", format_id.to_string()),
                ("filename", chapter_filename.clone()),
                ("platform", Platform::P10901.as_param().to_string()),
                ("vt", "217".to_string()),
                ("charge", "0".to_string()),
            ];
            let key_url = format!("{}/getkey", self.api_base);
            let Some(key_text) = self
                .client
                .get_text(&key_url, &key_params, self.tokens.active())
                .await?
            else {
                continue;
            };
            let Some(key_body) = strip_wrapped_json(&key_text) else {
                return Ok(None);
            };
            let Ok(key_data) = serde_json::from_str::<Value>(key_body) else {
                return Ok(None);
            };
            let Some(vkey) = key_data
                .get("key")
                .and_then(Value::as_str)
                .filter(|k| !k.is_empty())
            else {
                continue;
            };

            let mirrors: Vec<String> = chosen
                .iter()
                .map(|prefix| format!("{prefix}{chapter_filename}?sdtfrom=v1010&vkey={vkey}"))
                .collect();
            if !mirrors.is_empty() {
                urls.push(MirroredUrl::new(mirrors));
            }
        }

        // success only when every advertised chapter produced an entry;
        // partial results are discarded
        let chapter_count = data.pointer("/vl/vi/0/cl/fc").and_then(Value::as_u64);
        if chapter_count == Some(urls.len() as u64) {
            Ok(Some(ResolvedStream {
                name: quality,
                ext: ext.to_string(),
                urls,
            }))
        } else {
            debug!(
                video_id,
                ?chapter_count,
                assembled = urls.len(),
                "incomplete chapter set, discarding"
            );
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope and mirror helpers
// ---------------------------------------------------------------------------

/// Strips the fixed wrapper from an API response body
fn strip_wrapped_json(text: &str) -> Option<&str> {
    let body = text.trim().strip_prefix(WRAPPER_PREFIX)?;
    Some(body.strip_suffix(';').unwrap_or(body))
}

/// Hostname part of an origin prefix: everything before the first `/`
/// after the scheme separator
fn prefix_host(prefix: &str) -> &str {
    match prefix.get(8..).and_then(|rest| rest.find('/')) {
        Some(pos) => &prefix[..8 + pos],
        None => prefix,
    }
}

/// Collects every advertised origin-URL prefix from an info payload
fn collect_url_prefixes(data: &Value) -> Vec<String> {
    data.pointer("/vl/vi/0/ul/ui")
        .and_then(Value::as_array)
        .map(|ui| {
            ui.iter()
                .filter_map(|entry| entry.get("url").and_then(Value::as_str))
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Orders mirror prefixes with the operator's own edge servers first
///
/// Prefixes whose hostname ends in `.tc.qq.com` are primary; third-party
/// mirrors follow. When no primary prefix exists, the original order is
/// kept.
fn order_mirror_prefixes(prefixes: Vec<String>) -> Vec<String> {
    let origin: Vec<String> = prefixes
        .iter()
        .filter(|prefix| prefix_host(prefix).ends_with(ORIGIN_DOMAIN))
        .cloned()
        .collect();
    let mut chosen = if origin.is_empty() {
        prefixes.clone()
    } else {
        origin
    };
    for prefix in &prefixes {
        if !chosen.contains(prefix) {
            chosen.push(prefix.clone());
        }
    }
    chosen
}

/// Whether the first video entry is DRM-free; a missing flag counts as
/// protected
fn is_drm_free(data: &Value) -> bool {
    data.pointer("/vl/vi/0/drm").and_then(Value::as_i64) == Some(0)
}

/// Advertised format entries, empty when the payload has none
fn format_entries(data: &Value) -> &[Value] {
    data.pointer("/fl/fi")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
