//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers a run produces. Each type ensures type
//! safety and validates its textual format on construction.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp layout used for archive ids and output file names
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Archive snapshot identifier
///
/// Derived from the wall-clock time of the run with second granularity
/// (`YYYYMMDDHHMMSS`). When two runs start within the same second, the later
/// one carries a numeric suffix (`YYYYMMDDHHMMSS-1`, `-2`, ...).
///
/// # Examples
///
/// ```
/// use deidb::domain::ids::ArchiveId;
/// use std::str::FromStr;
///
/// let id = ArchiveId::from_str("20241019153000-2").unwrap();
/// assert_eq!(id.timestamp(), "20241019153000");
/// assert_eq!(id.suffix(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveId(String);

impl ArchiveId {
    /// Creates an ArchiveId from its textual form
    ///
    /// # Returns
    ///
    /// Returns `Ok(ArchiveId)` if the id is a 14-digit timestamp optionally
    /// followed by `-<n>`, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let (stamp, suffix) = match id.split_once('-') {
            Some((stamp, suffix)) => (stamp, Some(suffix)),
            None => (id.as_str(), None),
        };

        if stamp.len() != 14 || !stamp.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!(
                "Archive ID '{id}' must start with a 14-digit timestamp"
            ));
        }

        if let Some(suffix) = suffix {
            if suffix.is_empty() || suffix.parse::<u32>().is_err() {
                return Err(format!("Archive ID '{id}' has an invalid suffix"));
            }
        }

        Ok(Self(id))
    }

    /// Builds the base id for a wall-clock instant
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(at.format(ARCHIVE_TIMESTAMP_FORMAT).to_string())
    }

    /// Returns the id for the n-th collision within the same second
    pub fn with_suffix(&self, n: u32) -> Self {
        if n == 0 {
            return Self(self.timestamp().to_string());
        }
        Self(format!("{}-{}", self.timestamp(), n))
    }

    /// Timestamp component (without suffix)
    pub fn timestamp(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(s, _)| s)
    }

    /// Collision suffix, 0 when absent
    pub fn suffix(&self) -> u32 {
        self.0
            .split_once('-')
            .and_then(|(_, n)| n.parse().ok())
            .unwrap_or(0)
    }

    /// Returns the archive ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for ArchiveId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp()
            .cmp(other.timestamp())
            .then_with(|| self.suffix().cmp(&other.suffix()))
    }
}

impl PartialOrd for ArchiveId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArchiveId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ArchiveId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier of a single deidentification run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh random run id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_archive_id_valid() {
        let id = ArchiveId::new("20241019153000").unwrap();
        assert_eq!(id.as_str(), "20241019153000");
        assert_eq!(id.suffix(), 0);
    }

    #[test]
    fn test_archive_id_invalid() {
        assert!(ArchiveId::new("").is_err());
        assert!(ArchiveId::new("2024").is_err());
        assert!(ArchiveId::new("2024101915300x").is_err());
        assert!(ArchiveId::new("20241019153000-").is_err());
        assert!(ArchiveId::new("20241019153000-a").is_err());
    }

    #[test]
    fn test_archive_id_from_datetime() {
        let at = Local.with_ymd_and_hms(2024, 10, 19, 15, 30, 5).unwrap();
        let id = ArchiveId::from_datetime(&at);
        assert_eq!(id.as_str(), "20241019153005");
    }

    #[test]
    fn test_archive_id_suffix_roundtrip() {
        let base = ArchiveId::new("20241019153000").unwrap();
        let third = base.with_suffix(3);
        assert_eq!(third.as_str(), "20241019153000-3");
        assert_eq!(third.with_suffix(0), base);
    }

    #[test]
    fn test_archive_id_ordering_is_numeric_on_suffix() {
        let base = ArchiveId::new("20241019153000").unwrap();
        let mut ids = vec![base.with_suffix(10), base.with_suffix(2), base.clone()];
        ids.sort();
        assert_eq!(ids, vec![base.clone(), base.with_suffix(2), base.with_suffix(10)]);

        let later = ArchiveId::new("20241019153001").unwrap();
        assert!(base.with_suffix(10) < later);
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
