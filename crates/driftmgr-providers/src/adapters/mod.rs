pub mod aws;
pub mod azure;
pub mod digital_ocean;
pub mod gcp;

pub use aws::AwsAdapter;
pub use azure::AzureAdapter;
pub use digital_ocean::DigitalOceanAdapter;
pub use gcp::GcpAdapter;
