//! Types for the price store

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Last validated reading of the asset in both reference currencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Price in the primary currency
    pub primary: f64,

    /// Price in the secondary currency
    pub secondary: f64,

    /// Wall-clock time of the reading, epoch milliseconds
    pub observed_at_ms: i64,
}

impl PriceSnapshot {
    /// Create a snapshot observed now
    pub fn new(primary: f64, secondary: f64) -> Self {
        Self::observed_at(primary, secondary, Utc::now().timestamp_millis())
    }

    /// Create a snapshot with an explicit observation time
    pub fn observed_at(primary: f64, secondary: f64, observed_at_ms: i64) -> Self {
        Self {
            primary,
            secondary,
            observed_at_ms,
        }
    }

    /// Observation time as a UTC timestamp
    pub fn observed_at_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.observed_at_ms)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Get the age of the snapshot
    pub fn age(&self) -> std::time::Duration {
        let millis = Utc::now()
            .timestamp_millis()
            .saturating_sub(self.observed_at_ms);
        std::time::Duration::from_millis(millis.max(0) as u64)
    }

    /// Check if the snapshot is older than `threshold_seconds`
    pub fn is_stale(&self, threshold_seconds: u64) -> bool {
        self.age().as_secs() > threshold_seconds
    }
}

/// Point-in-time copy of everything the store exposes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreState {
    pub snapshot: Option<PriceSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
    /// Token of the most recently started fetch
    pub generation: u64,
}

/// Events emitted by the store whenever a fetch cycle completes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceStoreEvent {
    /// A fetch was accepted and replaced the snapshot
    SnapshotUpdated {
        id: Uuid,
        generation: u64,
        previous: Option<PriceSnapshot>,
        snapshot: PriceSnapshot,
        timestamp: DateTime<Utc>,
    },

    /// A current fetch failed; the previous snapshot stays visible
    FetchFailed {
        id: Uuid,
        generation: u64,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A fetch completed after a newer one had started and was ignored
    StaleResponseDiscarded {
        id: Uuid,
        generation: u64,
        current_generation: u64,
        timestamp: DateTime<Utc>,
    },
}

impl PriceStoreEvent {
    pub(crate) fn snapshot_updated(
        generation: u64,
        previous: Option<PriceSnapshot>,
        snapshot: PriceSnapshot,
    ) -> Self {
        Self::SnapshotUpdated {
            id: Uuid::new_v4(),
            generation,
            previous,
            snapshot,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn fetch_failed(generation: u64, error_message: String) -> Self {
        Self::FetchFailed {
            id: Uuid::new_v4(),
            generation,
            error_message,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn stale_discarded(generation: u64, current_generation: u64) -> Self {
        Self::StaleResponseDiscarded {
            id: Uuid::new_v4(),
            generation,
            current_generation,
            timestamp: Utc::now(),
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            PriceStoreEvent::SnapshotUpdated { id, .. } => *id,
            PriceStoreEvent::FetchFailed { id, .. } => *id,
            PriceStoreEvent::StaleResponseDiscarded { id, .. } => *id,
        }
    }

    /// Generation of the fetch that produced this event
    pub fn generation(&self) -> u64 {
        match self {
            PriceStoreEvent::SnapshotUpdated { generation, .. }
            | PriceStoreEvent::FetchFailed { generation, .. }
            | PriceStoreEvent::StaleResponseDiscarded { generation, .. } => *generation,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            PriceStoreEvent::SnapshotUpdated { .. } => "SNAPSHOT_UPDATED",
            PriceStoreEvent::FetchFailed { .. } => "FETCH_FAILED",
            PriceStoreEvent::StaleResponseDiscarded { .. } => "STALE_RESPONSE_DISCARDED",
        }
    }
}

impl std::fmt::Display for PriceStoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceStoreEvent::SnapshotUpdated { snapshot, .. } => write!(
                f,
                "Snapshot updated: {:.2} / {:.2}",
                snapshot.primary, snapshot.secondary
            ),
            PriceStoreEvent::FetchFailed { error_message, .. } => {
                write!(f, "Price fetch failed: {}", error_message)
            }
            PriceStoreEvent::StaleResponseDiscarded {
                generation,
                current_generation,
                ..
            } => write!(
                f,
                "Discarded response of fetch {} (current is {})",
                generation, current_generation
            ),
        }
    }
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh snapshot and no error
    Healthy,
    /// A snapshot exists but is stale or an error is showing
    Degraded,
    /// No snapshot yet
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_age_and_staleness() {
        let fresh = PriceSnapshot::new(1.0, 2.0);
        assert!(!fresh.is_stale(60));

        let old_ms = Utc::now().timestamp_millis() - 120_000;
        let old = PriceSnapshot::observed_at(1.0, 2.0, old_ms);
        assert!(old.is_stale(60));
        assert!(old.age().as_secs() >= 120);
        assert_eq!(old.observed_at_utc().timestamp_millis(), old_ms);
    }

    #[test]
    fn test_age_with_extreme_timestamps() {
        let ancient = PriceSnapshot::observed_at(1.0, 2.0, i64::MIN);
        assert!(ancient.is_stale(60));
        assert_eq!(ancient.age().as_millis(), i64::MAX as u128);

        let future = PriceSnapshot::observed_at(1.0, 2.0, i64::MAX);
        assert_eq!(future.age(), std::time::Duration::ZERO);
        assert!(!future.is_stale(0));
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = PriceStoreEvent::fetch_failed(3, "Network error".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "FETCH_FAILED");
        assert_eq!(json["generation"], 3);
        assert_eq!(event.event_type(), "FETCH_FAILED");
        assert_eq!(event.to_string(), "Price fetch failed: Network error");
    }
}
