//! Resource-identity extraction from an audit event's request/response
//! payload, per spec.md §4.8 step 4. A small ordered table maps an
//! operation-name keyword to the resource type it acts on; per-type
//! extractors then pull the id/name/region out of whichever common key
//! the provider's event schema uses.

use driftmgr_core::model::CloudProviderKind;
use serde_json::Value;

use crate::raw_event::RawCloudEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub resource_id: String,
    pub resource_type: String,
    pub resource_name: Option<String>,
    pub region: Option<String>,
}

const RESOURCE_TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("Instance", "compute-instance"),
    ("Bucket", "storage-bucket"),
    ("Volume", "storage-volume"),
    ("SecurityGroup", "security-group"),
    ("Vpc", "network-core"),
    ("Subnet", "network-core"),
    ("Role", "iam"),
    ("Policy", "iam"),
    ("Database", "database"),
    ("DBInstance", "database"),
    ("Function", "compute-function"),
];

const ID_KEYS: &[&str] = &["instanceId", "resourceId", "bucketName", "volumeId", "groupId", "vpcId", "subnetId", "roleName", "functionName", "dBInstanceIdentifier", "id"];
const NAME_KEYS: &[&str] = &["name", "resourceName", "tagName"];
const REGION_KEYS: &[&str] = &["region", "availabilityZone", "awsRegion"];

fn first_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
}

fn resource_type_for(operation_name: &str) -> Option<&'static str> {
    RESOURCE_TYPE_KEYWORDS.iter().find(|(keyword, _)| operation_name.contains(keyword)).map(|(_, rt)| *rt)
}

/// Extracts a `ResourceIdentity` from the event's response (preferred,
/// since it reflects the resource as created/mutated) falling back to the
/// request parameters. `None` means the event didn't carry an identifiable
/// resource and should be dropped rather than forwarded half-formed.
pub fn extract_identity(event: &RawCloudEvent) -> Option<ResourceIdentity> {
    let resource_type = resource_type_for(&event.operation_name)?;

    let resource_id = first_string(&event.response_elements, ID_KEYS).or_else(|| first_string(&event.request_parameters, ID_KEYS))?;
    let resource_name = first_string(&event.response_elements, NAME_KEYS).or_else(|| first_string(&event.request_parameters, NAME_KEYS));
    let region = first_string(&event.response_elements, REGION_KEYS).or_else(|| first_string(&event.request_parameters, REGION_KEYS));

    Some(ResourceIdentity { resource_id, resource_type: resource_type.to_string(), resource_name, region })
}

pub fn provider_of(event: &RawCloudEvent) -> CloudProviderKind {
    event.provider
}
