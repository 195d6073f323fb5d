//! Catalog fixtures and record builders.

use roster_client::models::{EntityRef, Group, LineTemplate, PhoneBase, Role, Site};
use roster_provisioning::record::{EnrichedUser, IdentityRecord, RawRecord};

use super::fake_platform::FakePlatform;

pub fn group(id: &str, name: &str) -> Group {
    Group {
        id: id.to_string(),
        name: name.to_string(),
        version: 1,
        self_uri: None,
    }
}

pub fn role(id: &str, name: &str) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        self_uri: None,
    }
}

pub fn site(id: &str, name: &str) -> Site {
    Site {
        id: id.to_string(),
        name: name.to_string(),
        primary_sites: vec![EntityRef {
            id: format!("{id}-primary"),
            name: None,
            self_uri: None,
        }],
        self_uri: None,
    }
}

pub fn phone_base(id: &str, name: &str) -> PhoneBase {
    PhoneBase {
        id: id.to_string(),
        name: name.to_string(),
        lines: vec![LineTemplate {
            id: format!("{id}-line"),
            name: "Line 1".to_string(),
            self_uri: None,
        }],
        self_uri: None,
    }
}

/// Two groups, two roles, one site and one phone base.
pub fn standard_platform() -> FakePlatform {
    FakePlatform::new()
        .with_groups(vec![group("g1", "Support"), group("g2", "Sales")])
        .with_roles(vec![role("r1", "Agent"), role("r2", "Supervisor")])
        .with_sites(vec![site("s1", "Denver")])
        .with_phone_bases(vec![phone_base("pb1", "WebRTC Base")])
}

pub fn raw_record(name: &str, group: &str, role: &str) -> RawRecord {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    [
        ("NAME", name),
        ("EMAIL", email.as_str()),
        ("PASSWORD", "S3cret!pw"),
        ("GROUP", group),
        ("ROLE", role),
        ("SITENAME", "Denver"),
        ("PHONEBASE", "WebRTC Base"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn identity(name: &str, group: &str, role: &str) -> IdentityRecord {
    IdentityRecord::from_fields(&raw_record(name, group, role)).unwrap()
}

pub fn enriched_user(id: &str, name: &str, group: &Group, role: &Role) -> EnrichedUser {
    EnrichedUser {
        id: id.to_string(),
        record: identity(name, &group.name, &role.name),
        group: group.clone(),
        role: role.clone(),
        site: site("s1", "Denver"),
        phone_base: phone_base("pb1", "WebRTC Base"),
    }
}
