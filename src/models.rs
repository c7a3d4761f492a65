use std::fmt;
use std::marker::PhantomData;

use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Body of a GoCD `stage-status` notification.
#[derive(Debug, Clone, Deserialize)]
pub struct StageStatusRequest {
    pub pipeline: PipelineEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineEvent {
    pub name: String,
    #[serde(deserialize_with = "counter_as_string")]
    pub counter: String,
    pub stage: Stage,
    /// Only the first build cause is decoded, later ones are skipped unread.
    #[serde(rename = "build-cause", default, deserialize_with = "first_only")]
    pub build_cause: Vec<BuildCause>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildCause {
    pub material: Material,
    /// Holds at most the first modification.
    #[serde(default, deserialize_with = "first_only")]
    pub modifications: Vec<Modification>,
}

/// Only git materials carry anything this plugin reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Material {
    Git {
        #[serde(rename = "git-configuration")]
        configuration: GitConfiguration,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitConfiguration {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Modification {
    pub revision: String,
}

// Accepts a string or a number.
fn counter_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Counter {
        Text(String),
        Number(u64),
    }

    Ok(match Counter::deserialize(deserializer)? {
        Counter::Text(text) => text,
        Counter::Number(number) => number.to_string(),
    })
}

fn first_only<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct FirstOnly<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for FirstOnly<T> {
        type Value = Vec<T>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a sequence")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let first = seq.next_element::<T>()?;
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(first.into_iter().collect())
        }
    }

    deserializer.deserialize_seq(FirstOnly(PhantomData))
}
