//! Environment descriptor record.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Durable record of a running environment.
///
/// Produced by a successful `up`, read by every later lifecycle command and
/// deleted by `down`. Field names on disk stay compatible with existing state
/// files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDescriptor {
    pub project_name: String,
    #[serde(default)]
    pub project_key: String,
    pub project_dir: PathBuf,
    #[serde(rename = "devContainerID")]
    pub dev_container_id: String,
    #[serde(rename = "netNSID")]
    pub net_anchor_id: String,
    #[serde(rename = "serviceIDs", default, deserialize_with = "null_as_empty")]
    pub service_ids: Vec<String>,
    pub ssh_port: u16,
    pub remote_user: String,
}

// Older state files wrote `null` for an environment without services.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
