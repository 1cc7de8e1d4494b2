//! JSON Feed 1.0/1.1 document model (<https://jsonfeed.org/version/1.1>).
//!
//! Kept deliberately loose: every field is optional and unknown fields are
//! ignored, so any conformant JSON Feed document (and most sloppy ones) parse.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonFeed {
    pub version: Option<String>,
    pub title: Option<String>,
    pub home_page_url: Option<String>,
    pub feed_url: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub favicon: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub items: Vec<JsonItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonItem {
    /// Strings per JSON Feed 1.1, but numeric ids are common in the wild.
    pub id: Option<JsonId>,
    pub url: Option<String>,
    pub external_url: Option<String>,
    pub title: Option<String>,
    pub content_html: Option<String>,
    pub content_text: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub banner_image: Option<String>,
    pub date_published: Option<String>,
    pub date_modified: Option<String>,
    /// JSON Feed 1.0
    pub author: Option<JsonAuthor>,
    /// JSON Feed 1.1
    #[serde(deserialize_with = "null_as_empty")]
    pub authors: Vec<JsonAuthor>,
    #[serde(deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
}

/// Arrays written as `null` read as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonId {
    Text(String),
    Number(serde_json::Number),
}

impl JsonId {
    pub fn to_guid(&self) -> String {
        match self {
            JsonId::Text(s) => s.clone(),
            JsonId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonAuthor {
    pub name: Option<String>,
    pub url: Option<String>,
    pub avatar: Option<String>,
}

impl JsonFeed {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Whether `version` names a published JSON Feed version URL.
    pub fn has_known_version(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.contains("jsonfeed.org/version/"))
    }
}
