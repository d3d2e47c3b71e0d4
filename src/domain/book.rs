use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }

    /// Returns `None` for anything that cannot be a stored id. Only the
    /// hyphenated lowercase spelling ids are serialized with is accepted.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().filter(|u| u.hyphenated().to_string() == s).map(Self)
    }
}

impl Default for BookId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ReadingStatus {
    #[default]
    #[serde(rename = "quero_ler")]
    WantToRead,
    #[serde(rename = "lendo")]
    Reading,
    #[serde(rename = "lido")]
    Read,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [ReadingStatus::WantToRead, ReadingStatus::Reading, ReadingStatus::Read];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "quero_ler",
            ReadingStatus::Reading => "lendo",
            ReadingStatus::Read => "lido",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "Want to read",
            ReadingStatus::Reading => "Reading",
            ReadingStatus::Read => "Read",
        }
    }

    /// Reading has started, so a start date is expected.
    pub fn is_started(&self) -> bool { matches!(self, ReadingStatus::Reading | ReadingStatus::Read) }

    pub fn is_finished(&self) -> bool { matches!(self, ReadingStatus::Read) }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be one of quero_ler, lendo or lido")]
pub struct UnknownStatus;

impl FromStr for ReadingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quero_ler" => Ok(ReadingStatus::WantToRead),
            "lendo" => Ok(ReadingStatus::Reading),
            "lido" => Ok(ReadingStatus::Read),
            _ => Err(UnknownStatus),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub status: ReadingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(with = "millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "millis")]
    pub updated_at: DateTime<Utc>,
}

/// RFC 3339 with exactly three fractional digits, so timestamps also sort as
/// strings.
mod millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

impl Book {
    /// Builds a freshly stored record from validated input.
    pub fn from_new(id: BookId, input: NewBook, now: DateTime<Utc>) -> Self {
        Book {
            id,
            title: input.title,
            author: input.author,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            rating: input.rating,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the fields present in `patch`. Timestamps are left alone.
    pub fn apply(&mut self, patch: &BookPatch) {
        if let Some(t) = &patch.title { self.title = t.clone(); }
        if let Some(a) = &patch.author { self.author = a.clone(); }
        if let Some(s) = patch.status { self.status = s; }
        if let Some(d) = patch.start_date { self.start_date = d; }
        if let Some(d) = patch.end_date { self.end_date = d; }
        if let Some(r) = patch.rating { self.rating = r; }
    }

    /// Refreshes `updated_at`, keeping it strictly increasing.
    pub fn touch(&mut self) { self.updated_at = next_timestamp(self.updated_at); }
}

/// Current time at the precision timestamps are stored with.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(3) }

/// A timestamp strictly after `previous`, normally the current time.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous { now } else { previous + Duration::milliseconds(1) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub status: ReadingStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub rating: Option<u8>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            status: ReadingStatus::default(),
            start_date: None,
            end_date: None,
            rating: None,
        }
    }
}

/// A partial update. For the optional fields the outer `Option` says whether
/// the field was supplied; `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<ReadingStatus>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub rating: Option<Option<u8>>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool { *self == BookPatch::default() }
}
