//! Expiry policies for cached entries
//!
//! A policy is a pure value: evaluating it only compares an entry's age with
//! the configured rule and never touches the filesystem or the network.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::expiry::{FOREVER, NOCACHE};
use crate::errors::CacheError;

use super::path::EntryKind;

/// Expiry rule for one kind of read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Disk entries are always treated as stale
    #[default]
    NoCache,
    /// Disk entries never expire
    Forever,
    /// Disk entries older than the duration are stale
    After(Duration),
}

impl Expiry {
    /// Apply the rule to an entry of the given age
    pub fn is_expired(&self, age: Duration) -> bool {
        match self {
            Expiry::NoCache => true,
            Expiry::Forever => false,
            Expiry::After(limit) => age > *limit,
        }
    }
}

impl FromStr for Expiry {
    type Err = CacheError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(NOCACHE) {
            return Ok(Expiry::NoCache);
        }
        if trimmed.eq_ignore_ascii_case(FOREVER) {
            return Ok(Expiry::Forever);
        }

        let invalid = |reason: &str| CacheError::InvalidExpiry {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let seconds: f64 = trimmed.parse().map_err(|_| {
            invalid("expected 'nocache', 'forever' or a number of seconds")
        })?;
        if !seconds.is_finite() {
            return Err(invalid("seconds must be finite"));
        }
        if seconds < 0.0 {
            return Err(invalid("seconds must not be negative"));
        }

        Duration::try_from_secs_f64(seconds)
            .map(Expiry::After)
            .map_err(|_| invalid("seconds out of range"))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::NoCache => f.write_str(NOCACHE),
            Expiry::Forever => f.write_str(FOREVER),
            Expiry::After(d) if d.subsec_nanos() == 0 => write!(f, "{}s", d.as_secs()),
            Expiry::After(d) => write!(f, "{}s", d.as_secs_f64()),
        }
    }
}

/// Shape accepted from configuration files: `300`, `2.5`, `"300"`, `"forever"`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExpiry {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawExpiry::deserialize(deserializer)? {
            RawExpiry::Int(i) => i.to_string(),
            RawExpiry::Float(f) => f.to_string(),
            RawExpiry::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Expiry::NoCache => serializer.serialize_str(NOCACHE),
            Expiry::Forever => serializer.serialize_str(FOREVER),
            Expiry::After(d) if d.subsec_nanos() == 0 => serializer.serialize_u64(d.as_secs()),
            Expiry::After(d) => serializer.serialize_f64(d.as_secs_f64()),
        }
    }
}

/// Independent expiry rules for detail reads and list reads
///
/// Unset fields behave as [`Expiry::NoCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpiryPolicy {
    #[serde(rename = "detail", default, skip_serializing_if = "Option::is_none")]
    pub detail_expiry: Option<Expiry>,
    #[serde(rename = "list", default, skip_serializing_if = "Option::is_none")]
    pub list_expiry: Option<Expiry>,
}

impl ExpiryPolicy {
    pub fn new(detail_expiry: Expiry, list_expiry: Expiry) -> Self {
        Self {
            detail_expiry: Some(detail_expiry),
            list_expiry: Some(list_expiry),
        }
    }

    /// Policy under which disk entries never expire
    pub fn forever() -> Self {
        Self::new(Expiry::Forever, Expiry::Forever)
    }

    /// Parse a policy from optional user supplied strings
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidExpiry` if either value fails to parse
    pub fn parse(detail: Option<&str>, list: Option<&str>) -> Result<Self, CacheError> {
        Ok(Self {
            detail_expiry: detail.map(str::parse).transpose()?,
            list_expiry: list.map(str::parse).transpose()?,
        })
    }

    pub fn with_detail_expiry(mut self, expiry: Expiry) -> Self {
        self.detail_expiry = Some(expiry);
        self
    }

    pub fn with_list_expiry(mut self, expiry: Expiry) -> Self {
        self.list_expiry = Some(expiry);
        self
    }

    pub fn detail(&self) -> Expiry {
        self.detail_expiry.unwrap_or_default()
    }

    pub fn list(&self) -> Expiry {
        self.list_expiry.unwrap_or_default()
    }

    pub fn is_detail_expired(&self, age: Duration) -> bool {
        self.detail().is_expired(age)
    }

    pub fn is_list_expired(&self, age: Duration) -> bool {
        self.list().is_expired(age)
    }

    /// Evaluate the rule that governs entries of `kind`
    ///
    /// Id lists share the list rule.
    pub fn is_expired(&self, kind: EntryKind, age: Duration) -> bool {
        match kind {
            EntryKind::Detail => self.is_detail_expired(age),
            EntryKind::List | EntryKind::IdList => self.is_list_expired(age),
        }
    }

    /// Whether any field differs from the unset default
    pub fn is_configured(&self) -> bool {
        self.detail_expiry.is_some() || self.list_expiry.is_some()
    }
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_configured() {
            return f.write_str("no cache config");
        }
        write!(f, "detail={}, list={}", self.detail(), self.list())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_rules() {
        let hour = Duration::from_secs(3600);
        assert!(Expiry::NoCache.is_expired(Duration::ZERO));
        assert!(!Expiry::Forever.is_expired(hour * 24 * 365 * 100));

        let five = Expiry::After(Duration::from_secs(5));
        assert!(!five.is_expired(Duration::from_secs(4)));
        assert!(!five.is_expired(Duration::from_secs(5)));
        assert!(five.is_expired(Duration::from_secs(6)));
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!("nocache".parse::<Expiry>().unwrap(), Expiry::NoCache);
        assert_eq!(" Forever ".parse::<Expiry>().unwrap(), Expiry::Forever);
        assert_eq!(
            "300".parse::<Expiry>().unwrap(),
            Expiry::After(Duration::from_secs(300))
        );
        assert_eq!(
            "0.5".parse::<Expiry>().unwrap(),
            Expiry::After(Duration::from_millis(500))
        );
        assert_eq!("0".parse::<Expiry>().unwrap(), Expiry::After(Duration::ZERO));
    }

    #[test]
    fn test_parse_invalid_expiry() {
        for bad in ["-1", "soon", "", "inf", "NaN", "5m", "1e300"] {
            let err = bad.parse::<Expiry>().unwrap_err();
            assert!(
                matches!(err, CacheError::InvalidExpiry { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_unset_policy_is_nocache() {
        let policy = ExpiryPolicy::default();
        assert!(!policy.is_configured());
        assert!(policy.is_detail_expired(Duration::ZERO));
        assert!(policy.is_list_expired(Duration::ZERO));
        assert_eq!(policy.to_string(), "no cache config");
    }

    #[test]
    fn test_policy_fields_are_independent() {
        let policy = ExpiryPolicy::default()
            .with_detail_expiry(Expiry::Forever)
            .with_list_expiry(Expiry::After(Duration::from_secs(10)));

        assert!(policy.is_configured());
        let age = Duration::from_secs(60);
        assert!(!policy.is_expired(EntryKind::Detail, age));
        assert!(policy.is_expired(EntryKind::List, age));
        assert!(policy.is_expired(EntryKind::IdList, age));
        assert_eq!(policy.to_string(), "detail=forever, list=10s");
    }

    #[test]
    fn test_policy_parse() {
        let policy = ExpiryPolicy::parse(Some("forever"), None).unwrap();
        assert_eq!(policy.detail_expiry, Some(Expiry::Forever));
        assert_eq!(policy.list_expiry, None);
        assert!(policy.is_configured());

        assert!(ExpiryPolicy::parse(None, Some("-3")).is_err());
    }

    #[test]
    fn test_policy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            vm: ExpiryPolicy,
            group: ExpiryPolicy,
        }

        let parsed: Wrapper = toml::from_str(
            r#"
[vm]
detail = 60
list = "forever"

[group]
list = 2.5
"#,
        )
        .unwrap();

        assert_eq!(
            parsed.vm,
            ExpiryPolicy::new(Expiry::After(Duration::from_secs(60)), Expiry::Forever)
        );
        assert_eq!(parsed.group.detail_expiry, None);
        assert_eq!(
            parsed.group.list_expiry,
            Some(Expiry::After(Duration::from_millis(2500)))
        );

        let bad: Result<Wrapper, _> = toml::from_str("[vm]\ndetail = -4\n[group]\n");
        assert!(bad.is_err());
    }
}
