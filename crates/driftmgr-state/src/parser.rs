//! State-file parsing (C4), per spec.md §4.3/§6: the primary structured
//! format is a versioned JSON document with a `resources` array, each
//! carrying `type`, `name`, `provider`, and `instances[]`.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use driftmgr_core::error::{DriftError, ErrorKind};
use driftmgr_core::model::{CloudProviderKind, PropertyValue, GLOBAL_REGION};

use crate::model::{DeclaredInventory, DeclaredResource};

const DEFAULT_WORKSPACE: &str = "default";

#[derive(Debug, Deserialize)]
struct RawStateFile {
    #[serde(default)]
    resources: Vec<RawStateResource>,
}

#[derive(Debug, Deserialize)]
struct RawStateResource {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    provider: String,
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

pub fn load(path: &Path, workspace: Option<&str>) -> Result<DeclaredInventory, DriftError> {
    let contents = fs::read_to_string(path)?;
    let mtime = file_mtime(path);
    let workspace = workspace.unwrap_or(DEFAULT_WORKSPACE).to_string();
    let path_str = path.to_string_lossy().to_string();

    let raw: RawStateFile = serde_json::from_str(&contents)
        .map_err(|e| DriftError::new(ErrorKind::ValidationFailed, "state.load", format!("malformed state file {}: {e}", path.display())))?;

    let mut resources = Vec::new();
    for raw_resource in raw.resources {
        let provider = parse_provider(&raw_resource.provider);
        for instance in raw_resource.instances {
            let properties: IndexMap<String, PropertyValue> = instance
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::from(v.clone())))
                .collect();

            let id = instance
                .attributes
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| raw_resource.name.clone());
            let region = instance
                .attributes
                .get("region")
                .or_else(|| instance.attributes.get("location"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| GLOBAL_REGION.to_string());

            resources.push(DeclaredResource {
                id,
                name: raw_resource.name.clone(),
                resource_type: raw_resource.resource_type.clone(),
                provider,
                region,
                properties,
                workspace: workspace.clone(),
                state_file_path: path_str.clone(),
                resource_address: format!("{}.{}", raw_resource.resource_type, raw_resource.name),
                timestamp: mtime,
            });
        }
    }

    Ok(DeclaredInventory { resources })
}

fn parse_provider(raw: &str) -> CloudProviderKind {
    let lower = raw.to_lowercase();
    if lower.contains("aws") {
        CloudProviderKind::Aws
    } else if lower.contains("azurerm") || lower.contains("azure") {
        CloudProviderKind::Azure
    } else if lower.contains("google") || lower.contains("gcp") {
        CloudProviderKind::Gcp
    } else if lower.contains("digitalocean") {
        CloudProviderKind::DigitalOcean
    } else {
        CloudProviderKind::Aws
    }
}

fn file_mtime(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_the_primary_structured_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraform.tfstate");
        fs::write(
            &path,
            serde_json::json!({
                "version": 4,
                "resources": [{
                    "type": "aws_instance",
                    "name": "web",
                    "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                    "instances": [{
                        "attributes": { "id": "i-1", "region": "us-east-1", "instance_type": "t3.micro" }
                    }]
                }]
            })
            .to_string(),
        )
        .unwrap();

        let inventory = load(&path, None).unwrap();
        assert_eq!(inventory.resources.len(), 1);
        let resource = &inventory.resources[0];
        assert_eq!(resource.id, "i-1");
        assert_eq!(resource.provider, CloudProviderKind::Aws);
        assert_eq!(resource.workspace, "default");
    }

    #[test]
    fn rejects_malformed_json_with_validation_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraform.tfstate");
        fs::write(&path, "{not json").unwrap();

        let err = load(&path, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationFailed);
    }
}
