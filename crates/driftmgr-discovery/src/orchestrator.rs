//! Discovery Orchestrator (C3), per spec.md §4.2: builds the Cartesian
//! product of provider x region x resource-type, fans the resulting tasks
//! out on a bounded `JoinSet`, and aggregates results into one inventory
//! snapshot.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use driftmgr_core::error::DriftError;
use driftmgr_core::model::{CloudProviderKind, Inventory, Resource};
use driftmgr_core::sdk::ListResourcesParams;
use driftmgr_events::{DiscoveryProgress, Event, EventBus, EventType, JobRegistry};
use driftmgr_providers::ProviderRegistry;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use driftmgr_core::model::{JobStatus, JobType};

#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// `delete` or `import`, consumed downstream by the remediation planner
    /// (Testable Scenario 2); travels with the run because it's a property
    /// of *this* discovery's intended follow-up, not of any one resource.
    pub extras_policy: ExtrasPolicy,
    pub environment: Option<String>,
    pub parallel_workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrasPolicy {
    #[default]
    Delete,
    Import,
}

#[derive(Debug, Clone)]
struct DiscoveryTask {
    provider: CloudProviderKind,
    region: String,
    resource_type: String,
}

#[derive(Debug)]
pub struct DiscoveryOutcome {
    pub inventory: Inventory,
    pub dedup_count: u64,
    pub skipped: Vec<(DiscoveryTaskDescriptor, String)>,
    pub failed: Vec<(DiscoveryTaskDescriptor, String)>,
}

#[derive(Debug, Clone)]
pub struct DiscoveryTaskDescriptor {
    pub provider: CloudProviderKind,
    pub region: String,
    pub resource_type: String,
}

static SNAPSHOT_COUNTER: AtomicU64 = AtomicU64::new(1);

pub struct DiscoveryOrchestrator {
    registry: Arc<ProviderRegistry>,
    events: Arc<EventBus>,
    jobs: Arc<JobRegistry>,
}

impl DiscoveryOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, events: Arc<EventBus>, jobs: Arc<JobRegistry>) -> Self {
        Self { registry, events, jobs }
    }

    /// Produces a complete inventory snapshot. Returns the job id
    /// immediately to the caller's bookkeeping via `jobs`/`events`, and the
    /// final outcome once every task has finalized.
    pub async fn discover(
        &self,
        providers: &[CloudProviderKind],
        regions: &[String],
        resource_types: &[String],
        options: DiscoveryOptions,
        cancel: CancellationToken,
    ) -> Result<(String, DiscoveryOutcome), DriftError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let job = self.jobs.create(job_id.clone(), JobType::Discovery);
        self.jobs.transition(&job.id, JobStatus::Running)?;
        self.events.publish(Event::new(EventType::JobCreated, serde_json::json!({"job_id": job_id}))).await;

        let tasks = self.build_tasks(providers, regions, resource_types);
        let total_tasks = tasks.len().max(1);

        let global_permits = if options.parallel_workers == 0 { 10 } else { options.parallel_workers };
        let global_semaphore = Arc::new(Semaphore::new(global_permits));
        let per_provider_semaphores: Arc<DashMap<CloudProviderKind, Arc<Semaphore>>> = Arc::new(DashMap::new());
        for provider in providers {
            per_provider_semaphores.insert(*provider, Arc::new(Semaphore::new((global_permits / providers.len().max(1)).max(1))));
        }

        let accumulator: Arc<Mutex<Vec<Resource>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_keys: Arc<DashMap<(CloudProviderKind, String), ()>> = Arc::new(DashMap::new());
        let dedup_count = Arc::new(AtomicU64::new(0));
        let completed = Arc::new(AtomicU64::new(0));

        let mut skipped = Vec::new();
        let mut failed = Vec::new();
        let snapshot_id = SNAPSHOT_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut join_set: JoinSet<TaskOutcome> = JoinSet::new();
        for task in tasks {
            let registry = self.registry.clone();
            let global_semaphore = global_semaphore.clone();
            let provider_semaphore = per_provider_semaphores
                .get(&task.provider)
                .map(|s| s.clone())
                .unwrap_or_else(|| Arc::new(Semaphore::new(1)));
            let cancel = cancel.clone();
            let task_clone = task.clone();

            join_set.spawn(async move {
                if cancel.is_cancelled() {
                    return TaskOutcome::Failed(task_clone, "cancelled".to_string());
                }

                let _global_permit = match global_semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return TaskOutcome::Failed(task_clone, "semaphore closed".to_string()),
                };
                let _provider_permit = match provider_semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return TaskOutcome::Failed(task_clone, "semaphore closed".to_string()),
                };

                run_task(registry, task_clone, cancel).await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => TaskOutcome::Failed(
                    DiscoveryTaskDescriptor { provider: CloudProviderKind::Aws, region: String::new(), resource_type: String::new() },
                    join_error.to_string(),
                ),
            };

            match outcome {
                TaskOutcome::Completed(descriptor, mut resources) => {
                    let mut guard = accumulator.lock().await;
                    for resource in resources.drain(..) {
                        let key = (resource.provider, resource.id.clone());
                        if seen_keys.insert(key, ()).is_some() {
                            dedup_count.fetch_add(1, Ordering::Relaxed);
                            guard.retain(|existing| existing.key() != resource.key());
                        }
                        guard.push(resource);
                    }
                    let count = guard.len();
                    drop(guard);

                    self.events
                        .publish(Event::new(
                            EventType::DiscoveryProgress,
                            serde_json::to_value(DiscoveryProgress {
                                service: descriptor.provider.to_string(),
                                resource_type: descriptor.resource_type.clone(),
                                count,
                                message: format!("discovered {count} resources so far"),
                            })
                            .unwrap_or_default(),
                        ))
                        .await;
                }
                TaskOutcome::Skipped(descriptor, reason) => {
                    info!(provider = %descriptor.provider, region = %descriptor.region, %reason, "discovery task skipped");
                    skipped.push((descriptor, reason));
                }
                TaskOutcome::Failed(descriptor, reason) => {
                    warn!(provider = %descriptor.provider, region = %descriptor.region, %reason, "discovery task failed");
                    failed.push((descriptor, reason));
                }
            }

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            self.jobs.update_progress(&job_id, (done as f64 / total_tasks as f64) * 100.0)?;
        }

        let final_status = if cancel.is_cancelled() {
            JobStatus::Cancelled
        } else if !failed.is_empty() {
            JobStatus::Partial
        } else {
            JobStatus::Completed
        };
        self.jobs.transition(&job_id, final_status)?;
        self.events.publish(Event::new(EventType::JobCompleted, serde_json::json!({"job_id": job_id, "status": format!("{final_status:?}")}))).await;

        let resources = Arc::try_unwrap(accumulator).map(|m| m.into_inner()).unwrap_or_default();
        let inventory = Inventory::new(snapshot_id, resources);

        Ok((
            job_id,
            DiscoveryOutcome { inventory, dedup_count: dedup_count.load(Ordering::Relaxed), skipped, failed },
        ))
    }

    fn build_tasks(&self, providers: &[CloudProviderKind], regions: &[String], resource_types: &[String]) -> Vec<DiscoveryTaskDescriptor> {
        let mut tasks = Vec::new();
        for provider in providers {
            let supported: HashSet<&str> = self
                .registry
                .sdk(*provider)
                .map(|sdk| sdk.supported_resource_types().iter().copied().collect())
                .unwrap_or_default();

            for region in regions {
                for resource_type in resource_types {
                    if supported.contains(resource_type.as_str()) {
                        tasks.push(DiscoveryTaskDescriptor {
                            provider: *provider,
                            region: region.clone(),
                            resource_type: resource_type.clone(),
                        });
                    }
                }
            }
        }
        tasks
    }
}

enum TaskOutcome {
    Completed(DiscoveryTaskDescriptor, Vec<Resource>),
    Skipped(DiscoveryTaskDescriptor, String),
    Failed(DiscoveryTaskDescriptor, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use driftmgr_core::boundary::CloudCredentials;
    use driftmgr_core::model::{DiscoveryMethod, Provenance};
    use driftmgr_core::sdk::{CloudSdk, SdkMetrics};
    use driftmgr_providers::RetryPolicy;
    use std::collections::HashMap;

    struct StubSdk {
        resource_type: &'static str,
        ids: Vec<&'static str>,
    }

    #[async_trait]
    impl CloudSdk for StubSdk {
        async fn initialize(&self, _credentials: &CloudCredentials) -> Result<(), DriftError> {
            Ok(())
        }

        async fn list_resources(&self, _resource_type: &str, params: &ListResourcesParams) -> Result<Vec<Resource>, DriftError> {
            let now = Utc::now();
            Ok(self
                .ids
                .iter()
                .map(|id| Resource {
                    id: id.to_string(),
                    name: id.to_string(),
                    resource_type: self.resource_type.to_string(),
                    provider: CloudProviderKind::Aws,
                    region: params.region.clone(),
                    account: String::new(),
                    state: "active".to_string(),
                    tags: HashMap::new(),
                    properties: indexmap::IndexMap::new(),
                    created_at: now,
                    last_seen: now,
                    provenance: Provenance { discovered_by: CloudProviderKind::Aws, discovery_method: DiscoveryMethod::FullScan, source_event_id: None },
                })
                .collect())
        }

        async fn get_resource(&self, _id: &str) -> Result<Resource, DriftError> {
            unimplemented!()
        }

        async fn tag_resource(&self, _id: &str, _tags: &HashMap<String, String>) -> Result<(), DriftError> {
            Ok(())
        }

        fn metrics(&self) -> SdkMetrics {
            SdkMetrics::default()
        }

        fn supported_resource_types(&self) -> &'static [&'static str] {
            &["compute-instance"]
        }
    }

    #[tokio::test]
    async fn discovers_and_deduplicates_across_regions() {
        let registry = Arc::new(ProviderRegistry::new(RetryPolicy::default()));
        registry.register(
            CloudProviderKind::Aws,
            Arc::new(StubSdk { resource_type: "compute-instance", ids: vec!["i-1", "i-2"] }),
            driftmgr_providers::RateLimitParams { capacity: 100.0, refill_per_second: 1000.0 },
        );

        let orchestrator = DiscoveryOrchestrator::new(registry, Arc::new(EventBus::new()), Arc::new(JobRegistry::new()));
        let (_job_id, outcome) = orchestrator
            .discover(
                &[CloudProviderKind::Aws],
                &["us-east-1".to_string(), "us-west-2".to_string()],
                &["compute-instance".to_string()],
                DiscoveryOptions { parallel_workers: 4, ..Default::default() },
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.inventory.resources.len(), 4);
        assert!(!outcome.inventory.has_duplicates());
    }

    #[tokio::test]
    async fn unsupported_resource_types_are_filtered_before_dispatch() {
        let registry = Arc::new(ProviderRegistry::new(RetryPolicy::default()));
        registry.register(
            CloudProviderKind::Aws,
            Arc::new(StubSdk { resource_type: "compute-instance", ids: vec!["i-1"] }),
            driftmgr_providers::RateLimitParams { capacity: 100.0, refill_per_second: 1000.0 },
        );

        let orchestrator = DiscoveryOrchestrator::new(registry, Arc::new(EventBus::new()), Arc::new(JobRegistry::new()));
        let (_job_id, outcome) = orchestrator
            .discover(
                &[CloudProviderKind::Aws],
                &["us-east-1".to_string()],
                &["storage-bucket".to_string()],
                DiscoveryOptions::default(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(outcome.inventory.resources.is_empty());
    }
}

async fn run_task(registry: Arc<ProviderRegistry>, task: DiscoveryTaskDescriptor, cancel: CancellationToken) -> TaskOutcome {
    let sdk = match registry.sdk(task.provider) {
        Some(sdk) => sdk,
        None => return TaskOutcome::Skipped(task.clone(), "no adapter registered".to_string()),
    };

    let params = ListResourcesParams { region: task.region.clone(), account: None };
    let operation = format!("discover.{}.{}", task.provider, task.resource_type);

    let result = registry
        .invoke(task.provider, &operation, &cancel, || {
            let sdk = sdk.clone();
            let resource_type = task.resource_type.clone();
            let params = params.clone();
            async move { sdk.list_resources(&resource_type, &params).await }
        })
        .await;

    match result {
        Ok(mut resources) => {
            let now = Utc::now();
            for resource in &mut resources {
                resource.last_seen = now;
            }
            TaskOutcome::Completed(task, resources)
        }
        Err(err) if matches!(err.kind, driftmgr_core::error::ErrorKind::CredentialsMissing | driftmgr_core::error::ErrorKind::CredentialsInvalid) => {
            TaskOutcome::Skipped(task, err.message)
        }
        Err(err) => TaskOutcome::Failed(task, err.message),
    }
}
