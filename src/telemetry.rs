use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub kind: String,
    pub timestamp: SystemTime,
    pub detail: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    pub context: String,
    pub error: String,
}

/// In-process event sink shared by the agent and evaluator. Cloning shares
/// the underlying buffers.
#[derive(Default, Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    failures: Arc<Mutex<Vec<FailureRecord>>>,
}

impl TelemetryCollector {
    pub fn record(&self, kind: impl Into<String>, detail: serde_json::Value) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events.push(TelemetryEvent {
            kind: kind.into(),
            timestamp: SystemTime::now(),
            detail,
        });
    }

    pub fn record_failure(&self, context: impl Into<String>, error: impl Into<String>) {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failures.push(FailureRecord {
            context: context.into(),
            error: error.into(),
        });
    }

    pub fn drain(&self) -> (Vec<TelemetryEvent>, Vec<FailureRecord>) {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (std::mem::take(&mut *events), std::mem::take(&mut *failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_one_sink() {
        let telemetry = TelemetryCollector::default();
        let clone = telemetry.clone();
        clone.record("model_turn", json!({"turn": 0}));
        clone.record_failure("tool::calculate", "bad arguments");

        let (events, failures) = telemetry.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "model_turn");
        assert_eq!(failures.len(), 1);

        let (events, _) = telemetry.drain();
        assert!(events.is_empty());
    }
}
