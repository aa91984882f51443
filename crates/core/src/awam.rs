//! AWAM result map
//!
//! Accessibility results are keyed by an AWAM identifier (for example
//! `EIAO.A.10.1.1.4.PDF.1.1`). Each identifier holds either a single scalar
//! value or a mapping from a [`Location`] to a value. Once an identifier has
//! been written with one kind, writes of the other kind are rejected.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Fail,
    Pass,
    NotApplicable,
}

impl Status {
    /// Numeric code used in the result map: 0 fail, 1 pass, 2 not applicable.
    pub fn code(self) -> u8 {
        match self {
            Status::Fail => 0,
            Status::Pass => 1,
            Status::NotApplicable => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Fail => "Fail",
            Status::Pass => "Pass",
            Status::NotApplicable => "N/A",
        }
    }
}

impl From<bool> for Status {
    fn from(passed: bool) -> Self {
        if passed {
            Status::Pass
        } else {
            Status::Fail
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Where a located result was observed: a page number (0 when unknown) and
/// a sequence number distinguishing results on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub page: u32,
    pub seq: u32,
}

impl Location {
    pub fn new(page: u32, seq: u32) -> Self {
        Self { page, seq }
    }

    /// The `(0, 1)` location used for document-wide results.
    pub fn document() -> Self {
        Self { page: 0, seq: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page, self.seq)
    }
}

// JSON object keys must be strings.
impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A value stored in the result map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AwamValue {
    Status(Status),
    Text(String),
}

impl AwamValue {
    pub fn as_status(&self) -> Option<Status> {
        match self {
            AwamValue::Status(s) => Some(*s),
            AwamValue::Text(_) => None,
        }
    }
}

impl From<Status> for AwamValue {
    fn from(status: Status) -> Self {
        AwamValue::Status(status)
    }
}

impl From<&str> for AwamValue {
    fn from(text: &str) -> Self {
        AwamValue::Text(text.to_string())
    }
}

impl From<String> for AwamValue {
    fn from(text: String) -> Self {
        AwamValue::Text(text)
    }
}

/// All results recorded for one AWAM identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AwamEntry {
    Scalar(AwamValue),
    Located(BTreeMap<Location, AwamValue>),
}

impl AwamEntry {
    fn kind(&self) -> &'static str {
        match self {
            AwamEntry::Scalar(_) => "scalar",
            AwamEntry::Located(_) => "located",
        }
    }
}

/// A write that would change the kind of an existing entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("AWAM identifier {id} already holds a {existing} value")]
pub struct AwamKindError {
    pub id: String,
    pub existing: &'static str,
}

/// Mapping of AWAM identifier to recorded results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AwamResultMap {
    entries: BTreeMap<String, AwamEntry>,
}

impl AwamResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&AwamEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<AwamEntry> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AwamEntry)> {
        self.entries.iter()
    }

    /// The located results of `id`, if it holds any.
    pub fn located(&self, id: &str) -> Option<&BTreeMap<Location, AwamValue>> {
        match self.entries.get(id) {
            Some(AwamEntry::Located(map)) => Some(map),
            _ => None,
        }
    }

    /// Look up a single located value.
    pub fn value_at(&self, id: &str, location: Location) -> Option<&AwamValue> {
        self.located(id).and_then(|map| map.get(&location))
    }

    /// Add a located result, creating the entry when missing.
    pub fn record(
        &mut self,
        id: &str,
        location: Location,
        value: impl Into<AwamValue>,
    ) -> Result<(), AwamKindError> {
        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(|| AwamEntry::Located(BTreeMap::new()));

        match entry {
            AwamEntry::Located(map) => {
                map.insert(location, value.into());
                Ok(())
            }
            other => Err(AwamKindError {
                id: id.to_string(),
                existing: other.kind(),
            }),
        }
    }

    /// Replace every located result of `id` with a single one.
    pub fn reset(
        &mut self,
        id: &str,
        location: Location,
        value: impl Into<AwamValue>,
    ) -> Result<(), AwamKindError> {
        if let Some(AwamEntry::Scalar(_)) = self.entries.get(id) {
            return Err(AwamKindError {
                id: id.to_string(),
                existing: "scalar",
            });
        }
        let mut map = BTreeMap::new();
        map.insert(location, value.into());
        self.entries.insert(id.to_string(), AwamEntry::Located(map));
        Ok(())
    }

    /// Store a scalar value.
    pub fn set_scalar(
        &mut self,
        id: &str,
        value: impl Into<AwamValue>,
    ) -> Result<(), AwamKindError> {
        if let Some(AwamEntry::Located(_)) = self.entries.get(id) {
            return Err(AwamKindError {
                id: id.to_string(),
                existing: "located",
            });
        }
        self.entries
            .insert(id.to_string(), AwamEntry::Scalar(value.into()));
        Ok(())
    }

    /// Fail and pass counts across the located results of `id`.
    pub fn tally(&self, id: &str) -> (usize, usize) {
        let Some(map) = self.located(id) else {
            return (0, 0);
        };
        map.values()
            .fold((0, 0), |(fail, pass), value| match value.as_status() {
                Some(Status::Fail) => (fail + 1, pass),
                Some(Status::Pass) => (fail, pass + 1),
                _ => (fail, pass),
            })
    }
}
