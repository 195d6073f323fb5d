//! Wire models for the remote administration API.
//!
//! Field names follow the platform's camelCase JSON. Only the fields the
//! provisioning engine reads or writes are modelled; unknown fields are
//! ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Reference to another platform entity, as embedded in request bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<String>,
}

/// One page of a paginated catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub entities: Vec<T>,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub total: u64,
    /// Number of pages the catalog spans at the configured page size.
    #[serde(default)]
    pub page_count: u32,
}

// ── Catalog entities ──────────────────────────────────────────────────

/// A group. `version` changes on every membership write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<String>,
}

/// An authorization role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<String>,
}

/// A telephony site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub primary_sites: Vec<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<String>,
}

impl Site {
    #[must_use]
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            self_uri: self.self_uri.clone(),
        }
    }
}

/// A line template declared by a phone base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<String>,
}

impl LineTemplate {
    #[must_use]
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            self_uri: self.self_uri.clone(),
        }
    }
}

/// Phone base settings: the template a soft phone is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneBase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub lines: Vec<LineTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_uri: Option<String>,
}

impl PhoneBase {
    #[must_use]
    pub fn to_ref(&self) -> EntityRef {
        EntityRef {
            id: self.id.clone(),
            name: Some(self.name.clone()),
            self_uri: self.self_uri.clone(),
        }
    }

    /// The first declared line template, used for new soft phones.
    #[must_use]
    pub fn primary_line(&self) -> Option<&LineTemplate> {
        self.lines.first()
    }
}

// ── Users ─────────────────────────────────────────────────────────────

/// Body of the create-user call.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A user account as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Version-tagged membership write for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGroupMembersRequest {
    pub member_ids: Vec<String>,
    pub version: u64,
}

// ── Telephony ─────────────────────────────────────────────────────────

/// Device capabilities advertised for a phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneCapabilities {
    pub provisions: bool,
    pub registers: bool,
    pub dual_registers: bool,
    pub hardware_id_type: String,
    pub allow_reboot: bool,
    pub no_rebalance: bool,
    pub no_cloud_provisioning: bool,
    pub media_codecs: Vec<String>,
}

/// A line on a phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneLine {
    pub name: String,
    pub line_base_settings: EntityRef,
}

/// Body of the create-phone call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhoneRequest {
    pub name: String,
    pub state: String,
    pub site: EntityRef,
    pub phone_base_settings: EntityRef,
    pub line_base_settings: EntityRef,
    pub phone_meta_base: EntityRef,
    pub lines: Vec<PhoneLine>,
    pub capabilities: PhoneCapabilities,
    pub web_rtc_user: EntityRef,
}

/// A created phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phone {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A station, the discoverable endpoint a user logs into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_rtc_user_id: Option<String>,
}
