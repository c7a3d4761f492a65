//! GoCD notification plugin request handling.
//!
//! The GoCD server talks to a notification plugin through named requests with
//! JSON bodies. Every request handled here answers with response code 200,
//! including a stage-status notification that failed: the failure is reported
//! in the body only, so the server keeps dispatching to the plugin.

use std::collections::HashMap;
use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{NotifierError, Result};
use crate::executor::{handle, NotificationResult};
use crate::models::StageStatusRequest;
use crate::settings::{
    SettingsForm, SettingsProvider, API_KEY, API_URL, API_USER, GO_SERVER_URL,
};

pub const SUCCESS_RESPONSE_CODE: u16 = 200;
pub const BAD_REQUEST_RESPONSE_CODE: u16 = 400;

const STAGE_STATUS: &str = "stage-status";

const SETTINGS_VIEW: &str = r#"<div class="form_item_block">
  <label>Bitbucket API URL:<span class="asterix">*</span></label>
  <input type="text" ng-model="api_url" ng-required="true"/>
  <span class="form_error" ng-show="GOINPUTNAME[api_url].$error.server">{{GOINPUTNAME[api_url].$error.server}}</span>
</div>
<div class="form_item_block">
  <label>Bitbucket user:<span class="asterix">*</span></label>
  <input type="text" ng-model="api_user" ng-required="true"/>
  <span class="form_error" ng-show="GOINPUTNAME[api_user].$error.server">{{GOINPUTNAME[api_user].$error.server}}</span>
</div>
<div class="form_item_block">
  <label>Bitbucket API key:<span class="asterix">*</span></label>
  <input type="password" ng-model="api_key" ng-required="true"/>
  <span class="form_error" ng-show="GOINPUTNAME[api_key].$error.server">{{GOINPUTNAME[api_key].$error.server}}</span>
</div>
<div class="form_item_block">
  <label>GoCD server URL:<span class="asterix">*</span></label>
  <input type="text" ng-model="go_server_url" ng-required="true"/>
  <span class="form_error" ng-show="GOINPUTNAME[go_server_url].$error.server">{{GOINPUTNAME[go_server_url].$error.server}}</span>
</div>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    NotificationsInterestedIn,
    StageStatus,
    GetConfiguration,
    GetView,
    ValidateConfiguration,
}

impl FromStr for RequestKind {
    type Err = NotifierError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            "notifications-interested-in" => Ok(Self::NotificationsInterestedIn),
            STAGE_STATUS => Ok(Self::StageStatus),
            "go.plugin-settings.get-configuration" => Ok(Self::GetConfiguration),
            "go.plugin-settings.get-view" => Ok(Self::GetView),
            "go.plugin-settings.validate-configuration" => Ok(Self::ValidateConfiguration),
            other => Err(NotifierError::UnhandledRequest(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoPluginApiResponse {
    pub response_code: u16,
    pub response_body: String,
}

impl GoPluginApiResponse {
    fn success<T: Serialize>(body: &T) -> Result<Self> {
        Ok(Self {
            response_code: SUCCESS_RESPONSE_CODE,
            response_body: serde_json::to_string(body)?,
        })
    }

    fn bad_request(error: &NotifierError) -> Self {
        Self {
            response_code: BAD_REQUEST_RESPONSE_CODE,
            response_body: json!({ "message": error.to_string() }).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldMetadata {
    #[serde(rename = "display-name")]
    display_name: &'static str,
    #[serde(rename = "display-value")]
    display_value: &'static str,
    required: bool,
    secure: bool,
    #[serde(rename = "display-order")]
    display_order: &'static str,
}

impl FieldMetadata {
    fn required(display_name: &'static str, secure: bool, display_order: &'static str) -> Self {
        Self {
            display_name,
            display_value: "",
            required: true,
            secure,
            display_order,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValidateConfigurationRequest {
    #[serde(rename = "plugin-settings", default)]
    plugin_settings: HashMap<String, SettingValue>,
}

#[derive(Debug, Deserialize)]
struct SettingValue {
    value: Option<String>,
}

impl ValidateConfigurationRequest {
    fn into_form(mut self) -> SettingsForm {
        let mut take = |key: &str| self.plugin_settings.remove(key).and_then(|s| s.value);

        SettingsForm {
            api_url: take(API_URL),
            api_user: take(API_USER),
            api_key: take(API_KEY),
            go_server_url: take(GO_SERVER_URL),
        }
    }
}

/// Answers one plugin request. Unknown request names, and bodies that cannot
/// be decoded for anything but stage-status, get a 400 response.
pub async fn dispatch(
    request_name: &str,
    body: &str,
    settings: &dyn SettingsProvider,
) -> GoPluginApiResponse {
    debug!("Handling plugin request '{request_name}'");

    let response = match request_name.parse::<RequestKind>() {
        Ok(kind) => respond(kind, body, settings).await,
        Err(e) => Err(e),
    };

    response.unwrap_or_else(|e| {
        warn!("Rejecting plugin request '{request_name}': {e}");
        GoPluginApiResponse::bad_request(&e)
    })
}

async fn respond(
    kind: RequestKind,
    body: &str,
    settings: &dyn SettingsProvider,
) -> Result<GoPluginApiResponse> {
    match kind {
        RequestKind::NotificationsInterestedIn => {
            GoPluginApiResponse::success(&json!({ "notifications": [STAGE_STATUS] }))
        }
        RequestKind::StageStatus => {
            let result = match serde_json::from_str::<StageStatusRequest>(body) {
                Ok(request) => handle(&request.pipeline, settings).await,
                Err(e) => {
                    let e = NotifierError::MalformedEvent(e.to_string());
                    warn!("{e}");
                    NotificationResult::failure(&e)
                }
            };
            GoPluginApiResponse::success(&result)
        }
        RequestKind::GetConfiguration => GoPluginApiResponse::success(&configuration()),
        RequestKind::GetView => {
            GoPluginApiResponse::success(&json!({ "template": SETTINGS_VIEW }))
        }
        RequestKind::ValidateConfiguration => {
            let request: ValidateConfigurationRequest = if body.trim().is_empty() {
                ValidateConfigurationRequest::default()
            } else {
                serde_json::from_str(body)?
            };
            GoPluginApiResponse::success(&request.into_form().validate())
        }
    }
}

fn configuration() -> IndexMap<&'static str, FieldMetadata> {
    IndexMap::from([
        (API_URL, FieldMetadata::required("Bitbucket API URL", false, "0")),
        (API_USER, FieldMetadata::required("Bitbucket user", false, "1")),
        (API_KEY, FieldMetadata::required("Bitbucket API key", true, "2")),
        (GO_SERVER_URL, FieldMetadata::required("GoCD server URL", false, "3")),
    ])
}
