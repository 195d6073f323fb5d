//! reqwest-based client for the remote administration API.

use crate::api::AdminApi;
use crate::auth::ApiAuth;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AddGroupMembersRequest, CreatePhoneRequest, CreateUserRequest, Group, Page, Phone, PhoneBase,
    Role, Site, Station, User,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP implementation of [`AdminApi`].
#[derive(Debug, Clone)]
pub struct HttpAdminClient {
    /// Base URL of the platform API (e.g. `https://api.mypurecloud.com`).
    base_url: String,
    auth: ApiAuth,
    http_client: Client,
}

impl HttpAdminClient {
    /// Create a client with its own connection pool and request timeout.
    pub fn new(base_url: String, auth: ApiAuth, timeout: Duration) -> ApiResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(base_url, auth, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(base_url: String, auth: ApiAuth, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            http_client,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn auth(&self) -> &ApiAuth {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2{}", self.base_url, path)
    }

    async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<T>> {
        let url = self.url(path);
        debug!(%url, page_number, page_size, "GET catalog page");
        let builder = self.http_client.get(&url).query(&[
            ("pageSize", page_size.to_string()),
            ("pageNumber", page_number.to_string()),
        ]);
        let response = self.auth.apply(builder).await?.send().await?;
        self.handle_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let builder = self.http_client.get(&url);
        let response = self.auth.apply(builder).await?.send().await?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let builder = self.http_client.post(&url).json(body);
        let response = self.auth.apply(builder).await?.send().await?;
        self.handle_response(response).await
    }

    /// Send a write whose response body is not needed.
    async fn send_without_body(&self, builder: reqwest::RequestBuilder) -> ApiResult<()> {
        let response = self.auth.apply(builder).await?.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        if response.status().is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| ApiError::Parse(format!("failed to parse response: {e}")))
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(body)),
            StatusCode::CONFLICT => Err(ApiError::Conflict(body)),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(retry_after_secs = ?retry_after, "Platform rate limited the request");
                Err(ApiError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
            StatusCode::UNAUTHORIZED => {
                self.auth.invalidate().await;
                Err(ApiError::Auth(format!("credential rejected (401): {body}")))
            }
            _ => Err(ApiError::Status {
                status: status.as_u16(),
                detail: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
            }),
        }
    }
}

#[async_trait]
impl AdminApi for HttpAdminClient {
    async fn create_user(&self, request: &CreateUserRequest) -> ApiResult<User> {
        self.post("/users", request).await
    }

    async fn list_groups(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Group>> {
        self.list_page("/groups", page_number, page_size).await
    }

    async fn list_roles(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Role>> {
        self.list_page("/authorization/roles", page_number, page_size)
            .await
    }

    async fn list_sites(&self, page_number: u32, page_size: u32) -> ApiResult<Page<Site>> {
        self.list_page("/telephony/providers/edges/sites", page_number, page_size)
            .await
    }

    async fn list_phone_bases(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> ApiResult<Page<PhoneBase>> {
        self.list_page(
            "/telephony/providers/edges/phonebasesettings",
            page_number,
            page_size,
        )
        .await
    }

    async fn get_group(&self, group_id: &str) -> ApiResult<Group> {
        self.get(&format!("/groups/{group_id}")).await
    }

    async fn add_group_members(
        &self,
        group_id: &str,
        request: &AddGroupMembersRequest,
    ) -> ApiResult<()> {
        let url = self.url(&format!("/groups/{group_id}/members"));
        debug!(%url, version = request.version, members = request.member_ids.len(), "POST");
        self.send_without_body(self.http_client.post(&url).json(request))
            .await
    }

    async fn add_role_members(&self, role_id: &str, user_ids: &[String]) -> ApiResult<()> {
        let url = self.url(&format!("/authorization/roles/{role_id}/users/add"));
        debug!(%url, members = user_ids.len(), "PUT");
        self.send_without_body(self.http_client.put(&url).json(user_ids))
            .await
    }

    async fn create_phone(&self, request: &CreatePhoneRequest) -> ApiResult<Phone> {
        self.post("/telephony/providers/edges/phones", request)
            .await
    }

    async fn find_stations_by_web_rtc_user(&self, user_id: &str) -> ApiResult<Vec<Station>> {
        let url = self.url("/stations");
        debug!(%url, user_id, "GET station search");
        let builder = self
            .http_client
            .get(&url)
            .query(&[("webRtcUserId", user_id)]);
        let response = self.auth.apply(builder).await?.send().await?;
        let page: Page<Station> = self.handle_response(response).await?;
        Ok(page.entities)
    }

    async fn set_default_station(&self, user_id: &str, station_id: &str) -> ApiResult<()> {
        let url = self.url(&format!(
            "/users/{user_id}/station/defaultstation/{station_id}"
        ));
        debug!(%url, "PUT");
        self.send_without_body(self.http_client.put(&url)).await
    }
}
