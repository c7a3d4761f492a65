use log::info;

use crate::error::{NotifierError, Result};
use crate::models::{Material, PipelineEvent};
use crate::settings::PluginSettings;

/// Returns the revision to report on when the first build cause is a git
/// checkout of the configured Bitbucket server, `None` when there is nothing
/// to report.
///
/// The match is plain substring containment of the API URL in the material
/// URL, so `https://bitbucket.example.com` also matches clones from
/// `https://bitbucket.example.com.mirror`.
pub fn should_notify<'a>(
    event: &'a PipelineEvent,
    settings: &PluginSettings,
) -> Result<Option<&'a str>> {
    let build_cause = event.build_cause.first().ok_or_else(|| {
        NotifierError::MalformedEvent(format!(
            "pipeline '{}' run {} has no build cause",
            event.name, event.counter
        ))
    })?;

    let Material::Git { configuration } = &build_cause.material else {
        info!(
            "Skipping {}/{}: triggering material is not git",
            event.name, event.counter
        );
        return Ok(None);
    };

    if !configuration.url.contains(settings.api_url()) {
        info!(
            "Skipping {}/{}: {} is not hosted on {}",
            event.name,
            event.counter,
            configuration.url,
            settings.api_url()
        );
        return Ok(None);
    }

    let modification = build_cause.modifications.first().ok_or_else(|| {
        NotifierError::MalformedEvent(format!(
            "git material {} has no modifications",
            configuration.url
        ))
    })?;

    Ok(Some(modification.revision.as_str()))
}
