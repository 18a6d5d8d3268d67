use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use safemap_alerts::{AlertNotifier, EvidenceAnalyzer, LogNotifier, MockAnalyzer};
use safemap_core::records::{sort_contacts, EmergencyContact, RouteRequest, SosEvent, UserProfile};
use safemap_core::route::RouteOptions;
use safemap_core::store::{IncidentRepository, MemoryIncidentStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct AppConfig {
    pub route_options: RouteOptions,
}

/// Raw evidence captured with an SOS, kept apart from the event itself.
#[derive(Debug, Clone, Default)]
pub struct SosEvidence {
    pub photo: Option<Vec<u8>>,
    pub audio: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub incidents: usize,
    pub profiles: usize,
    pub contacts: usize,
    pub sos_events: usize,
    pub routes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub incidents: Arc<dyn IncidentRepository>,
    pub profiles: Arc<DashMap<String, UserProfile>>,
    pub contacts: Arc<DashMap<String, EmergencyContact>>,
    pub sos_events: Arc<DashMap<String, SosEvent>>,
    pub evidence: Arc<DashMap<String, SosEvidence>>,
    pub routes: Arc<DashMap<String, RouteRequest>>,
    pub analyzer: Arc<dyn EvidenceAnalyzer>,
    pub notifier: Arc<dyn AlertNotifier>,
    pub config: Arc<AppConfig>,
    pub start_time: Instant,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        incidents: Arc<dyn IncidentRepository>,
        analyzer: Arc<dyn EvidenceAnalyzer>,
        notifier: Arc<dyn AlertNotifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            incidents,
            profiles: Arc::new(DashMap::new()),
            contacts: Arc::new(DashMap::new()),
            sos_events: Arc::new(DashMap::new()),
            evidence: Arc::new(DashMap::new()),
            routes: Arc::new(DashMap::new()),
            analyzer,
            notifier,
            config: Arc::new(config),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Reference time for date-range filters.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    pub fn contacts_for(&self, user_id: &str) -> Vec<EmergencyContact> {
        let mut contacts: Vec<EmergencyContact> = self
            .contacts
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        sort_contacts(&mut contacts);
        contacts
    }

    /// Newest first.
    pub fn sos_events_for(&self, user_id: &str) -> Vec<SosEvent> {
        let mut events: Vec<SosEvent> = self
            .sos_events
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }

    /// Newest first.
    pub fn routes_for(&self, user_id: &str) -> Vec<RouteRequest> {
        let mut routes: Vec<RouteRequest> = self
            .routes
            .iter()
            .filter(|e| e.value().user_id.as_deref() == Some(user_id))
            .map(|e| e.value().clone())
            .collect();
        routes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        routes
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            uptime_seconds: self.uptime_seconds(),
            incidents: self.incidents.len(),
            profiles: self.profiles.len(),
            contacts: self.contacts.len(),
            sos_events: self.sos_events.len(),
            routes: self.routes.len(),
        }
    }
}

impl Default for AppState {
    /// Empty store, mock analysis and log-only alerts.
    fn default() -> Self {
        Self::new(
            Arc::new(MemoryIncidentStore::new()),
            Arc::new(MockAnalyzer),
            Arc::new(LogNotifier),
            AppConfig::default(),
        )
    }
}
