//! Playlist Parser: fetches an M3U body and yields `RawChannel` entries
//! via a line-oriented, attribute-parsing state machine.

use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::models::RawChannel;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
const MAGIC_HEADER: &str = "#EXTM3U";

pub struct PlaylistParser {
    client: reqwest::Client,
    max_channels: usize,
}

impl PlaylistParser {
    pub fn new(max_channels: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("static reqwest client config is always valid"),
            max_channels,
        }
    }

    /// Fetch `url` and parse it into raw channels, truncating at
    /// `max_channels` to bound memory for oversized playlists.
    pub async fn fetch_and_parse(&self, url: &str) -> AppResult<Vec<RawChannel>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|_| AppError::M3uUnreachable {
                url: url.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AppError::M3uUnreachable {
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|_| AppError::M3uUnreachable {
                url: url.to_string(),
            })?;

        Self::parse(&body, self.max_channels)
    }

    /// Pure parsing, split out from the network fetch so it can be unit
    /// tested without a live server.
    pub fn parse(body: &str, max_channels: usize) -> AppResult<Vec<RawChannel>> {
        let mut lines = body.lines().map(str::trim);

        match lines.find(|line| !line.is_empty()) {
            Some(first) if first.starts_with(MAGIC_HEADER) => {}
            _ => return Err(AppError::NotM3u),
        }

        let mut channels = Vec::new();
        let all_lines: Vec<&str> = body.lines().collect();
        let mut i = 0;

        while i < all_lines.len() {
            let line = all_lines[i].trim();
            if let Some(attrs_and_name) = line.strip_prefix("#EXTINF:") {
                let next = all_lines.get(i + 1).map(|l| l.trim());
                let is_url_line = matches!(next, Some(n) if !n.is_empty()
                    && (n.starts_with("http://") || n.starts_with("https://")));

                if is_url_line {
                    let url_line = next.unwrap();
                    if let Some(channel) = Self::parse_extinf(attrs_and_name, url_line) {
                        channels.push(channel);
                        if channels.len() >= max_channels {
                            break;
                        }
                    }
                    // Consume both the directive and the URL line it paired with.
                    i += 2;
                } else {
                    // No valid URL line follows; this directive has no
                    // channel. Advance past it only, so the next line
                    // (which may itself be a directive) is still examined.
                    i += 1;
                }
            } else {
                i += 1;
            }
        }

        Ok(channels)
    }

    fn parse_extinf(attrs_and_name: &str, stream_url: &str) -> Option<RawChannel> {
        let comma_pos = attrs_and_name.rfind(',')?;
        let attributes_part = &attrs_and_name[..comma_pos];
        let trailing_name = attrs_and_name[comma_pos + 1..].trim();

        let mut tvg_name = None;
        let mut tvg_logo = None;
        let mut group_title = None;
        let mut external_id = None;

        for (key, value) in parse_attributes(attributes_part) {
            match key.as_str() {
                "tvg-id" => external_id = Some(value),
                "tvg-name" => tvg_name = Some(value),
                "tvg-logo" => tvg_logo = Some(value),
                "group-title" => group_title = Some(value),
                _ => {}
            }
        }

        // Display name precedence: EXTINF trailing text, else tvg-name,
        // else the URL itself.
        let name = if !trailing_name.is_empty() {
            trailing_name.to_string()
        } else if let Some(tvg_name) = tvg_name {
            tvg_name
        } else {
            stream_url.to_string()
        };

        Some(RawChannel {
            name,
            stream_url: stream_url.to_string(),
            group_title,
            external_id,
            logo_url: tvg_logo,
        })
    }
}

/// Parses `key="value"` / `key=value` pairs from an EXTINF attribute list.
fn parse_attributes(attributes: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let mut current_key = String::new();
    let mut current_value = String::new();
    let mut in_quotes = false;
    let mut in_value = false;

    for ch in attributes.chars() {
        match ch {
            '"' if in_value => in_quotes = !in_quotes,
            '=' if !in_quotes && !in_value => in_value = true,
            ' ' | '\t' if !in_quotes => {
                if in_value && !current_value.is_empty() {
                    attrs.push((
                        current_key.trim().to_string(),
                        current_value.trim_matches('"').to_string(),
                    ));
                    current_key.clear();
                    current_value.clear();
                    in_value = false;
                }
            }
            _ => {
                if in_value {
                    current_value.push(ch);
                } else {
                    current_key.push(ch);
                }
            }
        }
    }

    if in_value && !current_value.is_empty() {
        attrs.push((
            current_key.trim().to_string(),
            current_value.trim_matches('"').to_string(),
        ));
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_body_without_magic_header() {
        let err = PlaylistParser::parse("not an m3u file\nfoo", 100);
        assert!(matches!(err, Err(AppError::NotM3u)));
    }

    #[test]
    fn parses_basic_playlist() {
        let body = "#EXTM3U\n#EXTINF:-1 tvg-id=\"espn.us\" tvg-name=\"ESPN\" \
                     group-title=\"Sports\",ESPN HD\nhttp://example.com/espn.m3u8\n";
        let channels = PlaylistParser::parse(body, 100).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "ESPN HD");
        assert_eq!(channels[0].external_id.as_deref(), Some("espn.us"));
        assert_eq!(channels[0].group_title.as_deref(), Some("Sports"));
        assert_eq!(channels[0].stream_url, "http://example.com/espn.m3u8");
    }

    #[test]
    fn falls_back_to_tvg_name_then_url() {
        let body = "#EXTM3U\n#EXTINF:-1 tvg-name=\"Fallback Name\",\nhttp://example.com/a.m3u8\n\
                     #EXTINF:-1,\nhttp://example.com/b.m3u8\n";
        let channels = PlaylistParser::parse(body, 100).unwrap();
        assert_eq!(channels[0].name, "Fallback Name");
        assert_eq!(channels[1].name, "http://example.com/b.m3u8");
    }

    #[test]
    fn skips_entries_missing_a_url_line() {
        let body = "#EXTM3U\n#EXTINF:-1,Orphan Entry\n#EXTINF:-1,Real Entry\nhttp://example.com/x.m3u8\n";
        let channels = PlaylistParser::parse(body, 100).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].name, "Real Entry");
    }

    #[test]
    fn truncates_at_max_channels() {
        let mut body = String::from("#EXTM3U\n");
        for i in 0..10 {
            body.push_str(&format!("#EXTINF:-1,Channel {i}\nhttp://example.com/{i}.m3u8\n"));
        }
        let channels = PlaylistParser::parse(&body, 3).unwrap();
        assert_eq!(channels.len(), 3);
    }
}
