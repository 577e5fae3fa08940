//! Cloud Event Listener (C9), per spec.md §4.8: turns a provider's raw
//! audit-event stream into buffered `resource.changed` events on the
//! shared bus.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use driftmgr_core::model::CloudProviderKind;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use driftmgr_events::{Event, EventBus, EventType};

use crate::classify::{classify, is_ignorable};
use crate::dedup::DedupCache;
use crate::identity::extract_identity;
use crate::raw_event::RawCloudEvent;

const BUFFER_CAPACITY: usize = 200;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// One normalized change derived from a raw audit event, the payload
/// carried by the `resource.changed` bus event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceChange {
    pub provider: CloudProviderKind,
    pub resource_id: String,
    pub resource_type: String,
    pub resource_name: Option<String>,
    pub region: Option<String>,
    pub kind: String,
    pub source_event_id: String,
    pub observed_at: DateTime<Utc>,
}

pub struct CloudEventListener {
    events: Arc<EventBus>,
    dedup: Arc<DedupCache>,
    recent: Arc<Mutex<Vec<ResourceChange>>>,
    cancel: CancellationToken,
}

impl CloudEventListener {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self { events, dedup: Arc::new(DedupCache::new()), recent: Arc::new(Mutex::new(Vec::new())), cancel: CancellationToken::new() }
    }

    /// Starts draining `source`, buffering classified resource changes and
    /// flushing either on a full buffer or on a timeout, whichever comes
    /// first. Returns immediately; the drain runs on a spawned task until
    /// `stop()` is called or `source` closes.
    pub fn start(&self, mut source: mpsc::Receiver<RawCloudEvent>) {
        let events = self.events.clone();
        let dedup = self.dedup.clone();
        let recent = self.recent.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let mut buffer: Vec<ResourceChange> = Vec::with_capacity(BUFFER_CAPACITY);
            let mut ticker = tokio::time::interval(FLUSH_INTERVAL);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        flush(&events, &recent, &mut buffer).await;
                        break;
                    }
                    _ = ticker.tick() => {
                        flush(&events, &recent, &mut buffer).await;
                    }
                    maybe_event = source.recv() => {
                        match maybe_event {
                            None => {
                                flush(&events, &recent, &mut buffer).await;
                                break;
                            }
                            Some(raw) => {
                                if let Some(change) = process_one(&dedup, raw) {
                                    buffer.push(change);
                                    if buffer.len() >= BUFFER_CAPACITY {
                                        flush(&events, &recent, &mut buffer).await;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });
    }

    /// Cooperative shutdown: the drain loop observes this on its next
    /// suspension point, flushes whatever is buffered, then exits.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub async fn recent_events(&self, since: DateTime<Utc>) -> Vec<ResourceChange> {
        self.recent.lock().await.iter().filter(|c| c.observed_at >= since).cloned().collect()
    }
}

fn process_one(dedup: &DedupCache, raw: RawCloudEvent) -> Option<ResourceChange> {
    if dedup.is_duplicate(&raw.event_id) {
        debug!(event_id = %raw.event_id, "dropping duplicate cloud event");
        return None;
    }
    if is_ignorable(&raw) {
        return None;
    }

    let identity = extract_identity(&raw)?;
    let kind = classify(&raw.operation_name);

    Some(ResourceChange {
        provider: raw.provider,
        resource_id: identity.resource_id,
        resource_type: identity.resource_type,
        resource_name: identity.resource_name,
        region: identity.region,
        kind: format!("{kind:?}").to_lowercase(),
        source_event_id: raw.event_id,
        observed_at: raw.event_time,
    })
}

async fn flush(events: &Arc<EventBus>, recent: &Arc<Mutex<Vec<ResourceChange>>>, buffer: &mut Vec<ResourceChange>) {
    if buffer.is_empty() {
        return;
    }
    let mut drained = std::mem::take(buffer);
    for change in &drained {
        let payload = serde_json::to_value(change).unwrap_or(serde_json::Value::Null);
        events.publish(Event::new(EventType::ResourceChanged, payload)).await;
    }
    let mut guard = recent.lock().await;
    guard.append(&mut drained);
    let overflow = guard.len().saturating_sub(10_000);
    if overflow > 0 {
        guard.drain(0..overflow);
    }
}

impl Drop for CloudEventListener {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            warn!("cloud event listener dropped without an explicit stop()");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::{sleep, Duration as TokioDuration};

    fn raw_event(id: &str, operation_name: &str) -> RawCloudEvent {
        RawCloudEvent {
            event_id: id.to_string(),
            provider: CloudProviderKind::Aws,
            operation_name: operation_name.to_string(),
            event_time: Utc::now(),
            is_role_assumption: false,
            request_parameters: json!({}),
            response_elements: json!({"instanceId": "i-1"}),
        }
    }

    #[tokio::test]
    async fn ignorable_events_never_show_up_in_recent_events() {
        let bus = Arc::new(EventBus::new());
        let listener = CloudEventListener::new(bus);
        let (tx, rx) = mpsc::channel(10);
        listener.start(rx);

        tx.send(raw_event("e-1", "DescribeInstances")).await.unwrap();
        tx.send(raw_event("e-2", "RunInstances")).await.unwrap();
        drop(tx);
        sleep(TokioDuration::from_millis(50)).await;
        listener.stop();
        sleep(TokioDuration::from_millis(20)).await;

        let recent = listener.recent_events(Utc::now() - chrono::Duration::minutes(1)).await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].resource_id, "i-1");
    }

    #[tokio::test]
    async fn duplicate_event_ids_are_only_recorded_once() {
        let bus = Arc::new(EventBus::new());
        let listener = CloudEventListener::new(bus);
        let (tx, rx) = mpsc::channel(10);
        listener.start(rx);

        tx.send(raw_event("e-1", "RunInstances")).await.unwrap();
        tx.send(raw_event("e-1", "RunInstances")).await.unwrap();
        drop(tx);
        sleep(TokioDuration::from_millis(50)).await;
        listener.stop();
        sleep(TokioDuration::from_millis(20)).await;

        let recent = listener.recent_events(Utc::now() - chrono::Duration::minutes(1)).await;
        assert_eq!(recent.len(), 1);
    }
}
