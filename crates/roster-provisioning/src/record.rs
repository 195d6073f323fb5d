//! Identity records and their enriched form.

use crate::error::{ProvisionError, ProvisionResult};
use roster_client::models::{Group, PhoneBase, Role, Site};
use std::collections::HashMap;

/// A raw input row: field name to value, as produced by an input reader.
pub type RawRecord = HashMap<String, String>;

pub const FIELD_NAME: &str = "NAME";
pub const FIELD_EMAIL: &str = "EMAIL";
pub const FIELD_PASSWORD: &str = "PASSWORD";
pub const FIELD_GROUP: &str = "GROUP";
pub const FIELD_ROLE: &str = "ROLE";
pub const FIELD_SITE: &str = "SITENAME";
pub const FIELD_PHONE_BASE: &str = "PHONEBASE";

/// Look up a field by name. An exact key wins; otherwise the smallest key
/// equal to `name` ignoring ASCII case. Blank values count as absent.
#[must_use]
pub fn field<'a>(raw: &'a RawRecord, name: &str) -> Option<&'a str> {
    raw.get(name)
        .or_else(|| {
            raw.iter()
                .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, value)| value)
        })
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn required(raw: &RawRecord, name: &'static str) -> ProvisionResult<String> {
    field(raw, name)
        .map(str::to_string)
        .ok_or(ProvisionError::MissingField(name))
}

/// One identity to provision, with its references still expressed as
/// logical names.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub name: String,
    pub email: String,
    pub password: String,
    pub group: String,
    pub role: String,
    pub site: String,
    pub phone_base: String,
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("group", &self.group)
            .field("role", &self.role)
            .field("site", &self.site)
            .field("phone_base", &self.phone_base)
            .finish()
    }
}

impl IdentityRecord {
    /// Build a record from a raw field mapping.
    ///
    /// Only presence is checked; the values are passed to the platform as is.
    pub fn from_fields(raw: &RawRecord) -> ProvisionResult<Self> {
        Ok(Self {
            name: required(raw, FIELD_NAME)?,
            email: required(raw, FIELD_EMAIL)?,
            password: required(raw, FIELD_PASSWORD)?,
            group: required(raw, FIELD_GROUP)?,
            role: required(raw, FIELD_ROLE)?,
            site: required(raw, FIELD_SITE)?,
            phone_base: required(raw, FIELD_PHONE_BASE)?,
        })
    }
}

/// A created account with every reference resolved against the catalog.
#[derive(Debug, Clone)]
pub struct EnrichedUser {
    /// Account id assigned by the platform.
    pub id: String,
    pub record: IdentityRecord,
    pub group: Group,
    pub role: Role,
    pub site: Site,
    pub phone_base: PhoneBase,
}

impl EnrichedUser {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn full_row() -> RawRecord {
        raw(&[
            ("NAME", "Ada Lovelace"),
            ("EMAIL", "ada@example.com"),
            ("PASSWORD", "pw"),
            ("GROUP", "Support"),
            ("ROLE", "Agent"),
            ("SITENAME", "Dublin"),
            ("PHONEBASE", "WebRTC"),
        ])
    }

    #[test]
    fn test_field_prefers_exact_key() {
        let row = raw(&[("name", "lower"), ("NAME", "upper"), ("Name", "title")]);
        assert_eq!(field(&row, "NAME"), Some("upper"));
        assert_eq!(field(&row, "name"), Some("lower"));
    }

    #[test]
    fn test_field_case_fallback_is_deterministic() {
        let row = raw(&[("name", "lower"), ("Name", "title")]);
        for _ in 0..8 {
            assert_eq!(field(&row, "NAME"), Some("title"));
        }
    }

    #[test]
    fn test_from_fields_bulk_headers() {
        let record = IdentityRecord::from_fields(&full_row()).unwrap();
        assert_eq!(record.name, "Ada Lovelace");
        assert_eq!(record.site, "Dublin");
        assert_eq!(record.phone_base, "WebRTC");
    }

    #[test]
    fn test_from_fields_is_case_insensitive_and_trims() {
        let record = IdentityRecord::from_fields(&raw(&[
            ("name", "  Ada "),
            ("email", "ada@example.com"),
            ("password", "pw"),
            ("group", "Support"),
            ("role", "Agent"),
            ("sitename", "Dublin"),
            (" phonebase", "WebRTC"),
        ]))
        .unwrap();
        assert_eq!(record.name, "Ada");
        assert_eq!(record.phone_base, "WebRTC");
    }

    #[test]
    fn test_missing_or_blank_field_is_rejected() {
        let mut row = full_row();
        row.remove("ROLE");
        assert!(matches!(
            IdentityRecord::from_fields(&row),
            Err(ProvisionError::MissingField("ROLE"))
        ));

        let mut row = full_row();
        row.insert("SITENAME".into(), "   ".into());
        assert!(matches!(
            IdentityRecord::from_fields(&row),
            Err(ProvisionError::MissingField("SITENAME"))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let record = IdentityRecord::from_fields(&full_row()).unwrap();
        let rendered = format!("{record:?}");
        assert!(!rendered.contains("\"pw\""));
        assert!(rendered.contains("[REDACTED]"));
    }
}
