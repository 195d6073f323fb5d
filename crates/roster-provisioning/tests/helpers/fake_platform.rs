//! In-memory stand-in for the remote administration platform.
//!
//! Records every call (with the paused-clock instant it completed at) and
//! lets tests script catalog contents, failing pages, version conflicts,
//! slow account creation and station-index lag.

use async_trait::async_trait;
use roster_client::models::{
    AddGroupMembersRequest, CreatePhoneRequest, CreateUserRequest, Group, Page, Phone, PhoneBase,
    Role, Site, Station, User,
};
use roster_client::{AdminApi, ApiError, ApiResult, ReferenceKind};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateUser { name: String, user_id: Option<String> },
    ListPage { kind: ReferenceKind, page: u32 },
    GetGroup { group_id: String },
    AddGroupMembers { group_id: String, member_ids: Vec<String>, version: u64 },
    AddRoleMembers { role_id: String, member_ids: Vec<String> },
    CreatePhone { user_id: String, name: String },
    FindStations { user_id: String },
    SetDefaultStation { user_id: String, station_id: String },
}

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    roles: Vec<Role>,
    sites: Vec<Site>,
    phone_bases: Vec<PhoneBase>,
    failing_pages: HashSet<(ReferenceKind, u32)>,
    failing_creates: HashSet<String>,
    create_delays: HashMap<String, Duration>,
    /// Remaining rejected writes per group; each rejection bumps the version
    /// as if another process had written in between.
    group_conflicts: HashMap<String, u32>,
    /// Remaining transient (503) failures per role.
    role_failures: HashMap<String, u32>,
    failing_phones: HashSet<String>,
    /// Search attempt (per user) on which the station becomes visible.
    station_visible_on: Option<u32>,
    next_user: u32,
    phones: HashMap<String, String>,
    searches: HashMap<String, u32>,
    group_members: HashMap<String, Vec<String>>,
    role_members: HashMap<String, Vec<String>>,
    default_stations: HashMap<String, String>,
    calls: Vec<(Instant, Call)>,
}

pub struct FakePlatform {
    state: Mutex<State>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                station_visible_on: Some(1),
                ..State::default()
            }),
        }
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    // ── Scripting ────────────────────────────────────────────────────

    pub fn with_groups(self, groups: Vec<Group>) -> Self {
        self.with_state(|s| s.groups = groups)
    }

    pub fn with_roles(self, roles: Vec<Role>) -> Self {
        self.with_state(|s| s.roles = roles)
    }

    pub fn with_sites(self, sites: Vec<Site>) -> Self {
        self.with_state(|s| s.sites = sites)
    }

    pub fn with_phone_bases(self, phone_bases: Vec<PhoneBase>) -> Self {
        self.with_state(|s| s.phone_bases = phone_bases)
    }

    pub fn failing_page(self, kind: ReferenceKind, page: u32) -> Self {
        self.with_state(|s| {
            s.failing_pages.insert((kind, page));
        })
    }

    pub fn failing_create(self, name: &str) -> Self {
        self.with_state(|s| {
            s.failing_creates.insert(name.to_string());
        })
    }

    pub fn slow_create(self, name: &str, delay: Duration) -> Self {
        self.with_state(|s| {
            s.create_delays.insert(name.to_string(), delay);
        })
    }

    pub fn group_conflicts(self, group_id: &str, rejections: u32) -> Self {
        self.with_state(|s| {
            s.group_conflicts.insert(group_id.to_string(), rejections);
        })
    }

    pub fn role_failures(self, role_id: &str, failures: u32) -> Self {
        self.with_state(|s| {
            s.role_failures.insert(role_id.to_string(), failures);
        })
    }

    pub fn failing_phone(self, phone_name: &str) -> Self {
        self.with_state(|s| {
            s.failing_phones.insert(phone_name.to_string());
        })
    }

    /// `None` means the station never becomes visible.
    pub fn station_visible_on(self, attempt: Option<u32>) -> Self {
        self.with_state(|s| s.station_visible_on = attempt)
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn list_calls(&self, kind: ReferenceKind) -> usize {
        self.count(|c| matches!(c, Call::ListPage { kind: k, .. } if *k == kind))
    }

    pub fn user_id(&self, name: &str) -> Option<String> {
        self.calls().into_iter().find_map(|c| match c {
            Call::CreateUser {
                name: n,
                user_id: Some(id),
            } if n == name => Some(id),
            _ => None,
        })
    }

    pub fn group_members(&self, group_id: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().group_members.get(group_id).cloned()
    }

    pub fn role_members(&self, role_id: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().role_members.get(role_id).cloned()
    }

    pub fn group_version(&self, group_id: &str) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.version)
    }

    pub fn default_station(&self, user_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .default_stations
            .get(user_id)
            .cloned()
    }

    fn log(&self, call: Call) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push((Instant::now(), call));
    }

    fn list<T: Clone>(
        &self,
        kind: ReferenceKind,
        select: impl Fn(&State) -> &Vec<T>,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<T>> {
        self.log(Call::ListPage {
            kind,
            page: page_number,
        });
        let state = self.state.lock().unwrap();
        if state.failing_pages.contains(&(kind, page_number)) {
            return Err(ApiError::Status {
                status: 500,
                detail: format!("{kind} page {page_number} unavailable"),
            });
        }

        let items = select(&state);
        let size = page_size.max(1) as usize;
        let page_count = items.len().div_ceil(size).max(1) as u32;
        let start = (page_number as usize - 1) * size;
        let entities = items.iter().skip(start).take(size).cloned().collect();

        Ok(Page {
            entities,
            page_size,
            page_number,
            total: items.len() as u64,
            page_count,
        })
    }
}

#[async_trait]
impl AdminApi for FakePlatform {
    async fn create_user(&self, request: &CreateUserRequest) -> ApiResult<User> {
        let delay = self
            .state
            .lock()
            .unwrap()
            .create_delays
            .get(&request.name)
            .copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state.lock().unwrap();
            if state.failing_creates.contains(&request.name) {
                Err(ApiError::Status {
                    status: 400,
                    detail: "email already in use".into(),
                })
            } else {
                state.next_user += 1;
                Ok(User {
                    id: format!("user-{}", state.next_user),
                    name: Some(request.name.clone()),
                    email: Some(request.email.clone()),
                })
            }
        };

        self.log(Call::CreateUser {
            name: request.name.clone(),
            user_id: result.as_ref().ok().map(|u| u.id.clone()),
        });
        result
    }

    async fn list_groups(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Group>> {
        self.list(ReferenceKind::Group, |s| &s.groups, page_number, page_size)
    }

    async fn list_roles(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Role>> {
        self.list(ReferenceKind::Role, |s| &s.roles, page_number, page_size)
    }

    async fn list_sites(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Site>> {
        self.list(ReferenceKind::Site, |s| &s.sites, page_number, page_size)
    }

    async fn list_phone_bases(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<PhoneBase>> {
        self.list(
            ReferenceKind::PhoneBase,
            |s| &s.phone_bases,
            page_number,
            page_size,
        )
    }

    async fn get_group(&self, group_id: &str) -> ApiResult<Group> {
        self.log(Call::GetGroup {
            group_id: group_id.to_string(),
        });
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(group_id.to_string()))
    }

    async fn add_group_members(
        &self,
        group_id: &str,
        request: &AddGroupMembersRequest,
    ) -> ApiResult<()> {
        self.log(Call::AddGroupMembers {
            group_id: group_id.to_string(),
            member_ids: request.member_ids.clone(),
            version: request.version,
        });

        let mut state = self.state.lock().unwrap();
        let pending_conflict = match state.group_conflicts.get_mut(group_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };

        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| ApiError::NotFound(group_id.to_string()))?;

        if pending_conflict {
            // Someone else wrote first.
            group.version += 1;
        }
        if group.version != request.version {
            return Err(ApiError::Conflict(format!(
                "version {} is stale, current is {}",
                request.version, group.version
            )));
        }
        group.version += 1;

        state
            .group_members
            .entry(group_id.to_string())
            .or_default()
            .extend(request.member_ids.iter().cloned());
        Ok(())
    }

    async fn add_role_members(&self, role_id: &str, user_ids: &[String]) -> ApiResult<()> {
        self.log(Call::AddRoleMembers {
            role_id: role_id.to_string(),
            member_ids: user_ids.to_vec(),
        });

        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.role_failures.get_mut(role_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ApiError::Status {
                    status: 503,
                    detail: "try again".into(),
                });
            }
        }
        state
            .role_members
            .entry(role_id.to_string())
            .or_default()
            .extend(user_ids.iter().cloned());
        Ok(())
    }

    async fn create_phone(&self, request: &CreatePhoneRequest) -> ApiResult<Phone> {
        self.log(Call::CreatePhone {
            user_id: request.web_rtc_user.id.clone(),
            name: request.name.clone(),
        });

        let mut state = self.state.lock().unwrap();
        if state.failing_phones.contains(&request.name) {
            return Err(ApiError::Status {
                status: 400,
                detail: "invalid line configuration".into(),
            });
        }
        let phone_id = format!("phone-{}", request.web_rtc_user.id);
        state
            .phones
            .insert(request.web_rtc_user.id.clone(), phone_id.clone());
        Ok(Phone {
            id: phone_id,
            name: Some(request.name.clone()),
        })
    }

    async fn find_stations_by_web_rtc_user(&self, user_id: &str) -> ApiResult<Vec<Station>> {
        self.log(Call::FindStations {
            user_id: user_id.to_string(),
        });

        let mut state = self.state.lock().unwrap();
        let attempt = {
            let count = state.searches.entry(user_id.to_string()).or_default();
            *count += 1;
            *count
        };
        let visible = state.phones.contains_key(user_id)
            && state.station_visible_on.is_some_and(|on| attempt >= on);

        Ok(if visible {
            vec![Station {
                id: format!("station-{user_id}"),
                name: None,
                web_rtc_user_id: Some(user_id.to_string()),
            }]
        } else {
            Vec::new()
        })
    }

    async fn set_default_station(&self, user_id: &str, station_id: &str) -> ApiResult<()> {
        self.log(Call::SetDefaultStation {
            user_id: user_id.to_string(),
            station_id: station_id.to_string(),
        });
        self.state
            .lock()
            .unwrap()
            .default_stations
            .insert(user_id.to_string(), station_id.to_string());
        Ok(())
    }
}
