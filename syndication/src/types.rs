use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Conversion API endpoint; takes `rss_url` and `count` query parameters.
pub const CONVERSION_API: &str = "https://api.rss2json.com/v1/api.json";

/// How many items to request per poll.
pub const ITEMS_PER_POLL: u32 = 15;

/// One syndication source, tried in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct FeedSource {
    pub name: &'static str,
    pub url: &'static str,
}

/// Ordered source list; the first one that yields a non-empty feed wins.
pub const FEED_SOURCES: &[FeedSource] = &[
    FeedSource {
        name: "rss.app primary",
        url: "https://rss.app/feeds/v1/t8M5m7X9n0p2L4r6.xml",
    },
    FeedSource {
        name: "nitter",
        url: "https://nitter.net/saylor/rss",
    },
    FeedSource {
        name: "openrss",
        url: "https://openrss.org/twitter.com/saylor",
    },
];

#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    pub status: String,
    #[serde(default)]
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedItem {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
}

impl FeedItem {
    /// Body text with markup stripped: description when present, title
    /// otherwise. Empty result means the item carries no usable text.
    pub fn text(&self) -> String {
        let raw = if self.description.trim().is_empty() {
            &self.title
        } else {
            &self.description
        };
        strip_markup(raw)
    }

    /// Publication time in the conversion API's `%Y-%m-%d %H:%M:%S` UTC
    /// format; `None` when absent or unparseable.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.pub_date, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Latest feed contents plus which source produced them. `source` is `None`
/// when the built-in fallback dataset is in effect.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub items: Vec<FeedItem>,
    pub source: Option<&'static str>,
}

/// Drop `<...>` tags, flatten `&...;` entities to spaces, and collapse
/// whitespace runs.
fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    let mut in_entity = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            '&' if !in_tag => in_entity = true,
            ';' if in_entity => {
                in_entity = false;
                out.push(' ');
            }
            _ if in_tag || in_entity => {}
            _ => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_strips_markup_and_collapses_whitespace() {
        let item = FeedItem {
            description: "<p>Stacking&nbsp;sats   <b>forever</b></p>".to_string(),
            ..empty_item()
        };
        assert_eq!(item.text(), "Stacking sats forever");
    }

    #[test]
    fn text_falls_back_to_title() {
        let item = FeedItem {
            title: "plain title".to_string(),
            description: "   ".to_string(),
            ..empty_item()
        };
        assert_eq!(item.text(), "plain title");
    }

    #[test]
    fn published_at_parses_conversion_api_format() {
        let item = FeedItem {
            pub_date: "2021-02-15 18:30:00".to_string(),
            ..empty_item()
        };
        let at = item.published_at().unwrap();
        assert_eq!(at.to_rfc3339(), "2021-02-15T18:30:00+00:00");
    }

    #[test]
    fn published_at_is_none_for_garbage() {
        let item = FeedItem {
            pub_date: "yesterday".to_string(),
            ..empty_item()
        };
        assert!(item.published_at().is_none());
    }

    #[test]
    fn envelope_deserializes_with_missing_fields() {
        let envelope: FeedEnvelope =
            serde_json::from_str(r#"{"status":"ok","items":[{"title":"t"}]}"#).unwrap();
        assert_eq!(envelope.status, "ok");
        assert_eq!(envelope.items.len(), 1);
        assert_eq!(envelope.items[0].title, "t");
        assert!(envelope.items[0].guid.is_empty());
    }

    fn empty_item() -> FeedItem {
        FeedItem {
            guid: String::new(),
            title: String::new(),
            pub_date: String::new(),
            link: String::new(),
            author: String::new(),
            description: String::new(),
        }
    }
}
