//! Parsers for v.qq.com page payloads
//!
//! Contains modules for the embedded cover/episode script payloads and the
//! HLS playlist format.

pub mod cover;
pub mod playlist;

pub use cover::{
    default_cover_id, extract_cover_payload, extract_video_info_payload, parse_cover_payload,
};
pub use playlist::parse_segment_names;
