//! HLS playlist parsing
//!
//! Single-file formats on the segmented-stream API advertise an HLS
//! playlist; every non-comment, non-empty line of it is one segment name.

/// Extracts segment names from a newline-delimited playlist body
pub fn parse_segment_names(playlist: &str) -> Vec<&str> {
    playlist
        .lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segment_names() {
        let playlist = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:10.0,\negmovie.321003.1.ts\n#EXTINF:10.0,\negmovie.321003.2.ts\n#EXT-X-ENDLIST\n";
        assert_eq!(
            parse_segment_names(playlist),
            vec!["egmovie.321003.1.ts", "egmovie.321003.2.ts"]
        );
    }

    #[test]
    fn test_parse_segment_names_skips_blank_lines() {
        let playlist = "#EXTM3U\n\nseg.0.ts\n\n";
        assert_eq!(parse_segment_names(playlist), vec!["seg.0.ts"]);
    }

    #[test]
    fn test_parse_segment_names_crlf() {
        let playlist = "#EXTM3U\r\nseg.1.ts\r\nseg.2.ts\r\n";
        assert_eq!(parse_segment_names(playlist), vec!["seg.1.ts", "seg.2.ts"]);
    }

    #[test]
    fn test_parse_segment_names_empty() {
        assert!(parse_segment_names("").is_empty());
        assert!(parse_segment_names("#only-comments\n#here\n").is_empty());
    }
}
