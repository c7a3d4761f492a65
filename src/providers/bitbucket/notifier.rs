use log::info;

use super::client::BitbucketClient;
use super::status::{value_stream_map_url, BuildState, StatusPayload};
use crate::auth::Credentials;
use crate::error::Result;
use crate::models::PipelineEvent;
use crate::settings::PluginSettings;

/// Builds the status payload for a pipeline run. Fails without touching the
/// network when the stage state has no Bitbucket equivalent.
pub fn status_payload(
    event: &PipelineEvent,
    revision: &str,
    settings: &PluginSettings,
) -> Result<StatusPayload> {
    let state: BuildState = event.stage.state.parse()?;

    Ok(StatusPayload {
        state,
        key: revision.to_string(),
        name: event.counter.clone(),
        url: value_stream_map_url(settings.go_server_url(), &event.name, &event.counter),
    })
}

/// Reports the stage state of `event` against `revision`. One attempt, no retries.
pub async fn notify(event: &PipelineEvent, revision: &str, settings: &PluginSettings) -> Result<()> {
    let payload = status_payload(event, revision, settings)?;

    info!(
        "Notifying Bitbucket: {}/{} stage '{}' is {} at {revision}",
        event.name, event.counter, event.stage.name, event.stage.state
    );

    let credentials = Credentials::new(settings.api_user(), settings.api_key().clone());
    let client = BitbucketClient::new(settings.api_url(), credentials)?;
    client.post_build_status(revision, &payload).await
}
