//! Soft-phone provisioning and default-station binding.
//!
//! Creating a soft phone makes the platform create a station for it, but the
//! station only becomes searchable once the search index catches up. The
//! provisioner therefore polls for the station before binding it as the
//! user's default.

use crate::error::{ProvisionError, ProvisionResult};
use crate::record::EnrichedUser;
use crate::retry::RetryPolicy;
use roster_client::models::{
    CreatePhoneRequest, EntityRef, PhoneCapabilities, PhoneLine, Station,
};
use roster_client::AdminApi;
use std::sync::Arc;
use tracing::{info, warn};

const PHONE_META_BASE_ID: &str = "inin_webrtc_softphone.json";
const PHONE_META_BASE_NAME: &str = "PureCloud WebRTC Phone";

/// Device name derived from the user's display name.
#[must_use]
pub fn phone_name(user_name: &str) -> String {
    format!("{}_WEBRTC_PHONE", user_name.replace(' ', "_"))
}

/// Build the device-creation request for a user.
///
/// The line configuration comes from the phone base's first line template.
pub fn build_phone_request(user: &EnrichedUser) -> ProvisionResult<CreatePhoneRequest> {
    let line = user
        .phone_base
        .primary_line()
        .ok_or_else(|| ProvisionError::MissingLineTemplate {
            phone_base: user.phone_base.name.clone(),
        })?;

    Ok(CreatePhoneRequest {
        name: phone_name(user.name()),
        state: "active".to_string(),
        site: user.site.to_ref(),
        phone_base_settings: user.phone_base.to_ref(),
        line_base_settings: line.to_ref(),
        phone_meta_base: EntityRef {
            id: PHONE_META_BASE_ID.to_string(),
            name: Some(PHONE_META_BASE_NAME.to_string()),
            self_uri: None,
        },
        lines: vec![PhoneLine {
            name: line.name.clone(),
            line_base_settings: line.to_ref(),
        }],
        capabilities: PhoneCapabilities {
            provisions: false,
            registers: false,
            dual_registers: false,
            hardware_id_type: "mac".to_string(),
            allow_reboot: false,
            no_rebalance: false,
            no_cloud_provisioning: false,
            media_codecs: vec!["audio/opus".to_string()],
        },
        web_rtc_user: EntityRef {
            id: user.id.clone(),
            name: Some(user.name().replace(' ', "_")),
            self_uri: None,
        },
    })
}

/// Creates a soft phone per user and binds its station as the default.
#[derive(Clone)]
pub struct TelephonyProvisioner {
    api: Arc<dyn AdminApi>,
    station_policy: RetryPolicy,
}

impl TelephonyProvisioner {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, station_policy: RetryPolicy) -> Self {
        Self {
            api,
            station_policy,
        }
    }

    /// Create the device, wait for its station, bind it.
    ///
    /// Device creation is attempted once. If the station never shows up
    /// within the polling budget the binding step is skipped.
    pub async fn provision_phone(&self, user: &EnrichedUser) -> ProvisionResult<Station> {
        let request = build_phone_request(user)?;

        let phone = self.api.create_phone(&request).await.map_err(|error| {
            warn!(user_id = %user.id, phone = %request.name, error = %error, "Phone creation failed");
            ProvisionError::from(error)
        })?;
        info!(user_id = %user.id, phone_id = %phone.id, "Phone created");

        let station = self.wait_for_station(&user.id).await?;

        self.api
            .set_default_station(&user.id, &station.id)
            .await?;
        info!(user_id = %user.id, station_id = %station.id, "Default station assigned");

        Ok(station)
    }

    /// Poll the station index until a station owned by `user_id` appears.
    pub async fn wait_for_station(&self, user_id: &str) -> ProvisionResult<Station> {
        let api = &self.api;
        self.station_policy
            .execute("station_lookup", || async move {
                let stations = api.find_stations_by_web_rtc_user(user_id).await?;
                stations
                    .into_iter()
                    .next()
                    .ok_or_else(|| ProvisionError::StationNotYetIndexed {
                        user_id: user_id.to_string(),
                    })
            })
            .await
    }
}
