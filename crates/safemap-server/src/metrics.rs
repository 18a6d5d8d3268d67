use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use safemap_core::types::CrimeCategory;

/// Install the global Prometheus recorder and hand back its render handle.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

pub fn record_incident_reported(category: CrimeCategory) {
    counter!("incidents_reported_total", "category" => category.as_str()).increment(1);
}

pub fn record_assessment(score: u8) {
    counter!("safety_assessments_total").increment(1);
    histogram!("safety_score").record(f64::from(score));
}

pub fn record_sos_triggered() {
    counter!("sos_triggered_total").increment(1);
}

pub fn record_alerts(sent: usize, failed: usize) {
    counter!("sos_alerts_sent_total").increment(sent as u64);
    counter!("sos_alert_failures_total").increment(failed as u64);
}

pub fn record_analysis_failure() {
    counter!("ai_analysis_failures_total").increment(1);
}

pub fn record_route_planned() {
    counter!("routes_planned_total").increment(1);
}
