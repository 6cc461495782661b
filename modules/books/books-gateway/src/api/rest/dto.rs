//! JSON shapes of the books routes.
//!
//! Output follows the proto3 JSON mapping: `lowerCamelCase` names, every
//! field emitted, timestamps as RFC 3339 strings, unset messages as `null`.
//! Input accepts either the JSON name or the proto field name.

use std::fmt;

use prost_types::Timestamp;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// `google.protobuf.Timestamp` in its RFC 3339 JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rfc3339(pub Timestamp);

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// 0001-01-01T00:00:00Z
const MIN_SECONDS: i64 = -62_135_596_800;
/// 9999-12-31T23:59:59Z
const MAX_SECONDS: i64 = 253_402_300_799;

impl Rfc3339 {
    fn check(self) -> Result<Self, String> {
        let Timestamp { seconds, nanos } = self.0;
        if !(0..NANOS_PER_SECOND).contains(&nanos) {
            return Err(format!("timestamp nanos out of range: {nanos}"));
        }
        if !(MIN_SECONDS..=MAX_SECONDS).contains(&seconds) {
            return Err(format!("timestamp seconds out of range: {seconds}"));
        }
        Ok(self)
    }

    /// Render as `YYYY-MM-DDThh:mm:ss[.fff[fff[fff]]]Z`.
    ///
    /// # Errors
    /// Fails for nanos outside `0..1e9` or years outside `1..=9999`.
    pub fn format(&self) -> Result<String, String> {
        self.check().map(|valid| valid.0.to_string())
    }

    /// Parse an RFC 3339 string with any UTC offset.
    ///
    /// # Errors
    /// Fails when `raw` is not RFC 3339 or lies outside years `1..=9999`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let timestamp: Timestamp = raw.parse().map_err(|e: prost_types::TimestampError| {
            format!("invalid timestamp '{raw}': {e}")
        })?;
        Self(timestamp).check()
    }
}

impl Serialize for Rfc3339 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.format().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Rfc3339 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

struct Int32Visitor;

impl Visitor<'_> for Int32Visitor {
    type Value = i32;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 32-bit integer as a JSON number or decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i32, E> {
        i32::try_from(v).map_err(|_| E::custom(format!("{v} is out of the 32-bit integer range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i32, E> {
        i32::try_from(v).map_err(|_| E::custom(format!("{v} is out of the 32-bit integer range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i32, E> {
        v.trim()
            .parse()
            .map_err(|_| E::custom(format!("'{v}' is not a 32-bit integer")))
    }
}

/// An `int32` given as a JSON number or a decimal string.
fn int32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    deserializer.deserialize_any(Int32Visitor)
}

/// Response body of operations returning an empty message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Empty;

impl Serialize for Empty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }
}

// --- output ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub author_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub book_id: i32,
    pub author_id: i32,
    pub isbn: String,
    pub book_type: String,
    pub title: String,
    pub year: i32,
    pub available: Option<Rfc3339>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksByTagsRowDto {
    pub book_id: i32,
    pub title: String,
    pub name: Option<String>,
    pub isbn: String,
    pub tags: Vec<String>,
}

// --- input ---

/// Query of `GET /books-by-title-year`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BooksByTitleYearQuery {
    pub title: String,
    #[serde(deserialize_with = "int32")]
    pub year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateAuthorBody {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBookBody {
    #[serde(alias = "author_id", deserialize_with = "int32")]
    pub author_id: i32,
    pub isbn: String,
    #[serde(alias = "book_type")]
    pub book_type: String,
    pub title: String,
    #[serde(deserialize_with = "int32")]
    pub year: i32,
    pub available: Option<Rfc3339>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBookBody {
    pub title: String,
    pub tags: Vec<String>,
    #[serde(alias = "book_type")]
    pub book_type: String,
    #[serde(alias = "book_id", deserialize_with = "int32")]
    pub book_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBookIsbnBody {
    pub title: String,
    pub tags: Vec<String>,
    #[serde(alias = "book_id", deserialize_with = "int32")]
    pub book_id: i32,
    pub isbn: String,
}
