use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_registration(outcome: &'static str) {
    metrics::counter!("registrations_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_work_session_opened() {
    metrics::counter!("work_sessions_opened_total").increment(1);
}

pub(crate) fn record_work_session_closed(duration_minutes: i32) {
    metrics::counter!("work_sessions_closed_total").increment(1);
    metrics::histogram!("work_session_duration_minutes").record(f64::from(duration_minutes));
}
