use crate::domain::event::LoanEvent;
use crate::domain::ports::EventSink;

/// Logs every notification at `info` level under the `loan_events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &LoanEvent) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(target: "loan_events", id = event.loan_id(), "{json}"),
            Err(e) => tracing::warn!(%e, "Failed to serialize loan event"),
        }
    }
}

/// Fans a notification out to several sinks.
pub struct FanOutSink(pub Vec<Box<dyn EventSink>>);

impl EventSink for FanOutSink {
    fn emit(&self, event: &LoanEvent) {
        for sink in &self.0 {
            sink.emit(event);
        }
    }
}
