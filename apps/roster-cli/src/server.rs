//! On-demand provisioning over HTTP.
//!
//! `POST /user` provisions a single identity through the same pipeline as a
//! batch and answers once every stage has settled. All requests share one
//! [`Provisioner`], so reference catalogs are enumerated once per process.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use roster_provisioning::record::{
    FIELD_EMAIL, FIELD_GROUP, FIELD_NAME, FIELD_PASSWORD, FIELD_PHONE_BASE, FIELD_ROLE, FIELD_SITE,
};
use roster_provisioning::{Provisioner, RawRecord};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Body of `POST /user`.
#[derive(Deserialize)]
pub struct UserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub group: String,
    pub role: String,
    pub sitename: String,
    pub phonebase: String,
}

impl UserRequest {
    fn into_record(self) -> RawRecord {
        [
            (FIELD_NAME, self.name),
            (FIELD_EMAIL, self.email),
            (FIELD_PASSWORD, self.password),
            (FIELD_GROUP, self.group),
            (FIELD_ROLE, self.role),
            (FIELD_SITE, self.sitename),
            (FIELD_PHONE_BASE, self.phonebase),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

/// Build the router.
pub fn router(provisioner: Provisioner) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/user", post(create_user))
        .layer(TraceLayer::new_for_http())
        .with_state(provisioner)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_user(
    State(provisioner): State<Provisioner>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected provisioning request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": "Rejected",
                    "error": rejection.body_text(),
                })),
            )
                .into_response();
        }
    };

    info!(name = %request.name, "Provisioning request received");
    let manifest = provisioner.provision_one(request.into_record()).await;

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "Accepted",
            "manifest": manifest,
        })),
    )
        .into_response()
}
