use std::str::FromStr;

use serde::Serialize;

use crate::error::NotifierError;

/// Bitbucket build-status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildState {
    #[serde(rename = "INPROGRESS")]
    InProgress,
    #[serde(rename = "SUCCESSFUL")]
    Successful,
    #[serde(rename = "FAILED")]
    Failed,
}

impl FromStr for BuildState {
    type Err = NotifierError;

    /// Maps a GoCD stage state. Case-sensitive.
    fn from_str(stage_state: &str) -> Result<Self, Self::Err> {
        match stage_state {
            "Building" => Ok(Self::InProgress),
            "Passed" => Ok(Self::Successful),
            "Failed" | "Cancelled" => Ok(Self::Failed),
            other => Err(NotifierError::UnknownStageState(other.to_string())),
        }
    }
}

/// Body of `POST /rest/build-status/1.0/commits/{revision}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub state: BuildState,
    pub key: String,
    pub name: String,
    pub url: String,
}

pub fn value_stream_map_url(go_server_url: &str, pipeline_name: &str, counter: &str) -> String {
    format!(
        "{}/go/pipelines/value_stream_map/{pipeline_name}/{counter}",
        go_server_url.trim_end_matches('/')
    )
}
