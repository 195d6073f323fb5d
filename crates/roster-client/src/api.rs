//! The remote administration API surface the provisioning engine depends on.
//!
//! [`AdminApi`] is the seam between the engine and the network: the engine
//! only ever talks to a `dyn AdminApi`, which lets tests substitute an
//! in-memory platform.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::models::{
    AddGroupMembersRequest, CreatePhoneRequest, CreateUserRequest, Group, Page, Phone, PhoneBase,
    Role, Site, Station, User,
};

/// Remote administration API operations used during provisioning.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Create a user account.
    async fn create_user(&self, request: &CreateUserRequest) -> ApiResult<User>;

    /// List one page of groups.
    async fn list_groups(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Group>>;

    /// List one page of authorization roles.
    async fn list_roles(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Role>>;

    /// List one page of telephony sites.
    async fn list_sites(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Site>>;

    /// List one page of phone base settings.
    async fn list_phone_bases(&self, page_number: u32, page_size: u32)
        -> ApiResult<Page<PhoneBase>>;

    /// Read a group, including its current version.
    async fn get_group(&self, group_id: &str) -> ApiResult<Group>;

    /// Add members to a group. Rejected with a conflict when `version` is stale.
    async fn add_group_members(
        &self,
        group_id: &str,
        request: &AddGroupMembersRequest,
    ) -> ApiResult<()>;

    /// Grant a role to a set of users.
    async fn add_role_members(&self, role_id: &str, user_ids: &[String]) -> ApiResult<()>;

    /// Create a phone device.
    async fn create_phone(&self, request: &CreatePhoneRequest) -> ApiResult<Phone>;

    /// Search the station index for stations owned by a soft-phone user.
    async fn find_stations_by_web_rtc_user(&self, user_id: &str) -> ApiResult<Vec<Station>>;

    /// Make a station the user's default.
    async fn set_default_station(&self, user_id: &str, station_id: &str) -> ApiResult<()>;
}

/// Kinds of catalog entity an identity record refers to by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Group,
    Role,
    Site,
    PhoneBase,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group => write!(f, "group"),
            Self::Role => write!(f, "role"),
            Self::Site => write!(f, "site"),
            Self::PhoneBase => write!(f, "phone_base"),
        }
    }
}

/// A catalog entity that can be enumerated page by page and looked up by name.
#[async_trait]
pub trait CatalogEntity: Clone + Send + Sync + 'static {
    /// Which reference kind this entity represents.
    const KIND: ReferenceKind;

    fn id(&self) -> &str;

    /// Logical (human-readable) name, matched exactly.
    fn name(&self) -> &str;

    /// Fetch one page of this kind's catalog.
    async fn fetch_page(
        api: &dyn AdminApi,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<Self>>;
}

#[async_trait]
impl CatalogEntity for Group {
    const KIND: ReferenceKind = ReferenceKind::Group;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(
        api: &dyn AdminApi,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<Self>> {
        api.list_groups(page_number, page_size).await
    }
}

#[async_trait]
impl CatalogEntity for Role {
    const KIND: ReferenceKind = ReferenceKind::Role;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(
        api: &dyn AdminApi,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<Self>> {
        api.list_roles(page_number, page_size).await
    }
}

#[async_trait]
impl CatalogEntity for Site {
    const KIND: ReferenceKind = ReferenceKind::Site;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(
        api: &dyn AdminApi,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<Self>> {
        api.list_sites(page_number, page_size).await
    }
}

#[async_trait]
impl CatalogEntity for PhoneBase {
    const KIND: ReferenceKind = ReferenceKind::PhoneBase;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(
        api: &dyn AdminApi,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<Self>> {
        api.list_phone_bases(page_number, page_size).await
    }
}
