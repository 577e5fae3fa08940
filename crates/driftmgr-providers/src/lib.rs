pub mod adapters;
pub mod registry;
pub mod retry;
pub mod token_bucket;

pub use adapters::{AwsAdapter, AzureAdapter, DigitalOceanAdapter, GcpAdapter};
pub use registry::{ProviderMetrics, ProviderRegistry};
pub use retry::RetryPolicy;
pub use token_bucket::{AcquireOutcome, RateLimitParams, TokenBucket};
