//! Remote Reporter
//!
//! Ships finished distance reports to the remote key-value store. Callers
//! hand a report over and move on; the upload runs on its own task and
//! failures only reach the log.

use crate::domain::distance::DistanceReport;
use crate::domain::error::ReportError;
use crate::domain::settings::ReporterSettings;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub trait RemoteReporter: Send + Sync {
    /// Fire-and-forget. Must not block the caller on network I/O.
    fn submit(&self, report: DistanceReport);
}

#[derive(Debug, Serialize)]
struct GolfDistance {
    hole: u32,
    location: &'static str,
    distance: f64,
}

#[derive(Debug, Serialize)]
struct ClubDistance<'a> {
    name: &'a str,
    distance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportPayload<'a> {
    golf_distances: Vec<GolfDistance>,
    club_distances: Vec<ClubDistance<'a>>,
    golf_info: &'a str,
    timestamp: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Flattened wire form of a report.
pub fn report_payload(report: &DistanceReport, golf_info: &str, timestamp: String) -> serde_json::Value {
    let payload = ReportPayload {
        golf_distances: report
            .distances()
            .iter()
            .map(|d| GolfDistance {
                hole: d.landmark.hole,
                location: d.landmark.point.label(),
                distance: round2(d.yards),
            })
            .collect(),
        club_distances: report
            .equipment()
            .iter()
            .map(|e| ClubDistance {
                name: &e.name,
                distance: e.distance,
            })
            .collect(),
        golf_info,
        timestamp,
    };
    // Plain structs of strings and numbers always serialize
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}

/// Static informational text sent along with every report. A missing file
/// means an empty text.
pub fn load_golf_info(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return String::new();
    };
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read golf info from {}: {}", path.display(), e);
            String::new()
        }
    }
}

pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: Arc<str>,
    golf_info: Arc<str>,
}

impl HttpReporter {
    pub fn new(settings: &ReporterSettings, golf_info: String) -> Result<Self, ReportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: Arc::from(settings.endpoint_url.as_str()),
            golf_info: Arc::from(golf_info),
        })
    }

    async fn post(
        client: reqwest::Client,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<(), ReportError> {
        let response = client.post(endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

impl RemoteReporter for HttpReporter {
    fn submit(&self, report: DistanceReport) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let body = report_payload(&report, &self.golf_info, timestamp);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            match Self::post(client, &endpoint, body).await {
                Ok(()) => info!("Distance report pushed to remote store"),
                Err(e) => error!("Failed to push distance report: {}", e),
            }
        });
    }
}

/// Used when remote reporting is switched off in settings.
pub struct DisabledReporter;

impl RemoteReporter for DisabledReporter {
    fn submit(&self, report: DistanceReport) {
        debug!(
            landmarks = report.distances().len(),
            "Remote reporting disabled, report discarded"
        );
    }
}
