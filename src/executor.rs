use log::{info, warn};
use serde::Serialize;

use crate::eligibility::should_notify;
use crate::error::{NotifierError, Result};
use crate::models::PipelineEvent;
use crate::providers::bitbucket;
use crate::settings::SettingsProvider;

/// Outcome reported back to the GoCD server for a stage-status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NotificationResult {
    Success,
    Failure { messages: Vec<String> },
}

impl NotificationResult {
    pub fn failure(error: &NotifierError) -> Self {
        Self::Failure {
            messages: vec![error.to_string()],
        }
    }
}

/// Handles one stage-status event. Never fails: every error ends up in the
/// failure variant.
pub async fn handle(event: &PipelineEvent, settings: &dyn SettingsProvider) -> NotificationResult {
    match send_notification(event, settings).await {
        Ok(()) => NotificationResult::Success,
        Err(e) => {
            warn!(
                "Could not report {}/{} to Bitbucket: {e}",
                event.name, event.counter
            );
            NotificationResult::failure(&e)
        }
    }
}

async fn send_notification(event: &PipelineEvent, settings: &dyn SettingsProvider) -> Result<()> {
    let settings = settings.plugin_settings()?;

    match should_notify(event, &settings)? {
        Some(revision) => bitbucket::notify(event, revision, &settings).await,
        None => {
            info!("Nothing to report for {}/{}", event.name, event.counter);
            Ok(())
        }
    }
}
