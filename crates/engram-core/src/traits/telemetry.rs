// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telemetry sink contract.
//!
//! An injected, optional sink replaces any global telemetry state; the
//! engine defaults to [`NoopTelemetry`] when none is supplied.

use crate::types::TelemetryEvent;

/// Receives one event per engine operation.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: TelemetryEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: TelemetryEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_accepts_events() {
        let sink = NoopTelemetry;
        sink.record(TelemetryEvent::new("memory.add").with("keys", "user_id"));
    }
}
