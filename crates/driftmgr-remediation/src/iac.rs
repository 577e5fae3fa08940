//! Terraform HCL generation for a remediation plan's actions, grounded on
//! the resource-type-keyed conversion tables in the teacher's
//! `aion_cloud::terraform::generator` module, retargeted from deployment
//! templates onto remediation actions.

use hcl::{BlockBuilder, Body};

use driftmgr_core::model::{Action, ActionType, CloudProviderKind, PropertyValue};

fn provider_source(provider: CloudProviderKind) -> &'static str {
    match provider {
        CloudProviderKind::Aws => "hashicorp/aws",
        CloudProviderKind::Gcp => "hashicorp/google",
        CloudProviderKind::Azure => "hashicorp/azurerm",
        CloudProviderKind::DigitalOcean => "digitalocean/digitalocean",
    }
}

fn provider_version(provider: CloudProviderKind) -> &'static str {
    match provider {
        CloudProviderKind::Aws => "~> 5.0",
        CloudProviderKind::Gcp => "~> 5.0",
        CloudProviderKind::Azure => "~> 3.0",
        CloudProviderKind::DigitalOcean => "~> 2.0",
    }
}

fn terraform_resource_type(resource_type: &str, provider: CloudProviderKind) -> String {
    let prefix = match provider {
        CloudProviderKind::Aws => "aws",
        CloudProviderKind::Gcp => "google",
        CloudProviderKind::Azure => "azurerm",
        CloudProviderKind::DigitalOcean => "digitalocean",
    };
    let suffix = resource_type.replace('-', "_");
    format!("{prefix}_{suffix}")
}

fn sanitize_address(name: &str) -> String {
    let mut sanitized: String = name.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect();
    if sanitized.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        sanitized = format!("resource_{sanitized}");
    }
    sanitized
}

fn attribute_value(value: &PropertyValue) -> hcl::Value {
    match value {
        PropertyValue::Null => hcl::Value::Null,
        PropertyValue::Bool(b) => hcl::Value::Bool(*b),
        PropertyValue::Number(n) => hcl::Value::from(*n),
        PropertyValue::String(s) => hcl::Value::String(s.clone()),
        PropertyValue::Sequence(items) => hcl::Value::Array(items.iter().map(attribute_value).collect()),
        PropertyValue::Mapping(map) => {
            let object: hcl::Map<String, hcl::Value> = map.iter().map(|(k, v)| (k.clone(), attribute_value(v))).collect();
            hcl::Value::Object(object)
        }
    }
}

fn resource_block(resource_type: &str, address: &str, action: &Action) -> BlockBuilder {
    let mut builder = hcl::Block::builder("resource").add_label(resource_type).add_label(address);
    for (key, value) in &action.parameters {
        builder = builder.add_attribute((key.as_str(), attribute_value(value)));
    }
    builder
}

/// Generates the Terraform configuration implementing one plan's ordered
/// actions for a single provider. `Delete`/`Restore` actions carry no HCL
/// resource block of their own: a delete is the *absence* of the block
/// (the apply step relies on `terraform state rm`, not on generated code),
/// and a restore reconstructs the same block a `Create` would emit.
pub fn generate_hcl(provider: CloudProviderKind, actions: &[Action]) -> String {
    let mut body = Body::builder();

    let mut provider_spec = hcl::Map::new();
    provider_spec.insert("source".to_string(), hcl::Value::String(provider_source(provider).to_string()));
    provider_spec.insert("version".to_string(), hcl::Value::String(provider_version(provider).to_string()));

    let required_providers = hcl::Block::builder("terraform")
        .add_block(
            hcl::Block::builder("required_providers")
                .add_attribute((provider.as_str(), hcl::Value::Object(provider_spec)))
                .build(),
        )
        .build();
    body = body.add_block(required_providers);

    for action in actions {
        let address = sanitize_address(&action.resource_id);
        match action.action_type {
            ActionType::Delete => continue,
            ActionType::Create | ActionType::Update | ActionType::Import | ActionType::Restore => {
                let resource_type = terraform_resource_type(&resource_type_hint(action), provider);
                body = body.add_block(resource_block(&resource_type, &address, action).build());
            }
        }
    }

    hcl::to_string(&body.build()).unwrap_or_default()
}

/// Best-effort resource-type lookup from the action's own parameters,
/// falling back to a generic label rather than failing generation outright
/// when an upstream caller omitted it.
fn resource_type_hint(action: &Action) -> String {
    action
        .parameters
        .get("resource_type")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "resource".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn delete_actions_emit_no_resource_block() {
        let action = Action {
            id: "a".to_string(),
            resource_id: "i-1".to_string(),
            action_type: ActionType::Delete,
            parameters: BTreeMap::new(),
            risk: 0.0,
            estimated_time_secs: 0,
            dependencies: Vec::new(),
        };
        let hcl = generate_hcl(CloudProviderKind::Aws, &[action]);
        assert!(!hcl.contains("resource \""));
    }

    #[test]
    fn create_action_emits_a_resource_block_with_its_parameters() {
        let mut parameters = BTreeMap::new();
        parameters.insert("resource_type".to_string(), PropertyValue::String("compute-instance".to_string()));
        parameters.insert("instance_type".to_string(), PropertyValue::String("t3.micro".to_string()));
        let action = Action {
            id: "a".to_string(),
            resource_id: "i-1".to_string(),
            action_type: ActionType::Create,
            parameters,
            risk: 0.0,
            estimated_time_secs: 0,
            dependencies: Vec::new(),
        };
        let hcl = generate_hcl(CloudProviderKind::Aws, &[action]);
        assert!(hcl.contains("aws_compute_instance"));
        assert!(hcl.contains("t3.micro"));
    }
}
