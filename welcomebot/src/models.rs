use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned status id.
///
/// Ids are opaque tokens. Ordering compares by length first and then
/// lexicographically, which matches numeric order for the decimal snowflake
/// ids Mastodon hands out without ever parsing them.
///
/// Deserializes from a string or a bare integer, since some clients hand
/// cursors around as JSON numbers. Always serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StatusId(String);

impl StatusId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for StatusId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for StatusId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StatusId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl serde::de::Visitor<'_> for IdVisitor {
            type Value = StatusId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a status id string or non-negative integer")
            }

            fn visit_str<E: serde::de::Error>(self, raw: &str) -> Result<StatusId, E> {
                Ok(StatusId::new(raw))
            }

            fn visit_string<E: serde::de::Error>(self, raw: String) -> Result<StatusId, E> {
                Ok(StatusId(raw))
            }

            fn visit_u64<E: serde::de::Error>(self, raw: u64) -> Result<StatusId, E> {
                Ok(StatusId(raw.to_string()))
            }

            fn visit_i64<E: serde::de::Error>(self, raw: i64) -> Result<StatusId, E> {
                u64::try_from(raw)
                    .map(|id| StatusId(id.to_string()))
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Signed(raw), &self))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

impl From<&str> for StatusId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for StatusId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Direct,
    /// Anything newer servers send that we don't know about. Never eligible.
    Unknown(String),
}

impl Visibility {
    pub fn as_str(&self) -> &str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Direct => "direct",
            Visibility::Unknown(other) => other,
        }
    }
}

impl From<String> for Visibility {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "public" => Visibility::Public,
            "unlisted" => Visibility::Unlisted,
            "private" => Visibility::Private,
            "direct" => Visibility::Direct,
            _ => Visibility::Unknown(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Visibility::from)
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub acct: String,
}

/// A single post from a hashtag timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub visibility: Visibility,
    /// Present when this status is itself a boost of another one.
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
    #[serde(default)]
    pub in_reply_to_id: Option<StatusId>,
    #[serde(default)]
    pub in_reply_to_account_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub account: Option<Account>,
}

impl Status {
    /// Bare public status with no reply or boost markers.
    pub fn public(id: impl Into<StatusId>) -> Self {
        Self {
            id: id.into(),
            visibility: Visibility::Public,
            reblog: None,
            in_reply_to_id: None,
            in_reply_to_account_id: None,
            created_at: None,
            url: None,
            account: None,
        }
    }

    pub fn author(&self) -> &str {
        self.account
            .as_ref()
            .map(|account| account.acct.as_str())
            .unwrap_or("(unknown)")
    }
}

/// One page request against a hashtag timeline: `since_id < id < max_id`,
/// newest first, at most `limit` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub hashtag: String,
    pub since_id: Option<StatusId>,
    pub max_id: Option<StatusId>,
    pub limit: u32,
    pub local_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_numerically_across_widths() {
        let small = StatusId::from("999");
        let large = StatusId::from("1000");
        assert!(small < large);
        assert!(StatusId::from("110000000000000001") > StatusId::from("110000000000000000"));
    }

    #[test]
    fn status_deserializes_from_mastodon_json() {
        let raw = r#"{
            "id": "109372418374",
            "visibility": "public",
            "reblog": null,
            "in_reply_to_id": null,
            "in_reply_to_account_id": null,
            "created_at": "2022-11-20T18:04:12.000Z",
            "url": "https://example.social/@alice/109372418374",
            "account": { "id": "1", "acct": "alice" },
            "content": "<p>hello #introductions</p>"
        }"#;
        let status: Status = serde_json::from_str(raw).expect("parse status");
        assert_eq!(status.id.as_str(), "109372418374");
        assert_eq!(status.visibility, Visibility::Public);
        assert!(status.reblog.is_none());
        assert_eq!(status.author(), "alice");
        assert!(status.created_at.is_some());
    }

    #[test]
    fn ids_accept_integers_but_serialize_as_strings() {
        let id: StatusId = serde_json::from_str("109372418374").expect("integer id");
        assert_eq!(id, StatusId::from("109372418374"));
        assert_eq!(serde_json::to_string(&id).expect("json"), "\"109372418374\"");
        assert!(serde_json::from_str::<StatusId>("-1").is_err());
        assert!(serde_json::from_str::<StatusId>("1.5").is_err());
    }

    #[test]
    fn unknown_visibility_is_preserved() {
        let status: Status =
            serde_json::from_str(r#"{"id":"1","visibility":"local"}"#).expect("parse status");
        assert_eq!(status.visibility, Visibility::Unknown("local".into()));
        assert_eq!(status.visibility.as_str(), "local");
    }

    #[test]
    fn nested_reblog_parses() {
        let raw = r#"{
            "id": "2",
            "visibility": "public",
            "reblog": { "id": "1", "visibility": "public" }
        }"#;
        let status: Status = serde_json::from_str(raw).expect("parse status");
        assert_eq!(status.reblog.map(|inner| inner.id), Some(StatusId::from("1")));
    }
}
