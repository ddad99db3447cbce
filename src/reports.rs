//! Session-only reports.
//!
//! Reports live in a [`ReportBook`] for the lifetime of the process and are
//! never written to the store.

use crate::analytics::{ClientMetrics, TaskBuckets};
use crate::domain::ids::{REPORT_PREFIX, new_id};
use crate::error::{CoreError, CoreResult};
use crate::types::to_iso;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportType {
    Performance,
    Engagement,
    Resource,
    Financial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub description: String,
    pub generated_date: String,
    pub period: String,
    pub status: ReportStatus,
    pub metrics: Map<String, Value>,
}

#[derive(Debug, Default)]
pub struct ReportBook {
    reports: Vec<Report>,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    /// Build a draft Engagement report from current client metrics and the
    /// task buckets over all visible engagements.
    pub fn generate_engagement_report(
        &mut self,
        metrics: &[ClientMetrics],
        tasks: &TaskBuckets,
        now: DateTime<Utc>,
    ) -> &Report {
        let active_clients = metrics.iter().filter(|m| m.total_engagements > 0).count();
        let total_interactions: usize = metrics.iter().map(|m| m.total_interactions).sum();
        let period = now.format("%B %Y").to_string();

        let mut values = Map::new();
        values.insert("activeClients".to_string(), json!(active_clients));
        values.insert("totalInteractions".to_string(), json!(total_interactions));
        values.insert(
            "completionRate".to_string(),
            json!(format!("{}%", tasks.completion_rate())),
        );

        let report = Report {
            id: new_id(REPORT_PREFIX),
            name: format!("Client Engagement Report - {}", period),
            report_type: ReportType::Engagement,
            description: "Engagement statistics across active clients".to_string(),
            generated_date: to_iso(now),
            period,
            status: ReportStatus::Draft,
            metrics: values,
        };
        info!(id = %report.id, active_clients, "generated engagement report");

        let idx = self.reports.len();
        self.reports.push(report);
        &self.reports[idx]
    }

    pub fn publish(&mut self, id: &str) -> CoreResult<&Report> {
        self.set_status(id, ReportStatus::Published)
    }

    fn set_status(&mut self, id: &str, status: ReportStatus) -> CoreResult<&Report> {
        let report = self
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::report_not_found(id))?;
        report.status = status;
        Ok(report)
    }

    pub fn delete(&mut self, id: &str) -> CoreResult<Report> {
        let idx = self
            .reports
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| CoreError::report_not_found(id))?;
        Ok(self.reports.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::compute_client_metrics;
    use crate::error::ErrorCode;
    use crate::types::Client;
    use chrono::TimeZone;

    #[test]
    fn test_generate_publish_delete() {
        let now = Utc.with_ymd_and_hms(2025, 12, 3, 9, 0, 0).unwrap();
        let clients = vec![Client {
            id: "cli-1".to_string(),
            name: "Acme".to_string(),
            primary_contact: None,
            notes: None,
            created_at: "2025-01-01".to_string(),
            updated_at: "2025-01-01".to_string(),
        }];
        let metrics = compute_client_metrics(&clients, &[], &[], now);

        let mut book = ReportBook::new();
        let id = book
            .generate_engagement_report(&metrics, &TaskBuckets::default(), now)
            .id
            .clone();
        let report = book.get(&id).unwrap();
        assert_eq!(report.period, "December 2025");
        assert_eq!(report.status, ReportStatus::Draft);
        assert_eq!(report.metrics["activeClients"], json!(0));
        assert_eq!(report.metrics["completionRate"], json!("0%"));

        assert_eq!(book.publish(&id).unwrap().status, ReportStatus::Published);
        book.delete(&id).unwrap();
        assert_eq!(book.publish(&id).unwrap_err().code, ErrorCode::ReportNotFound);
    }

    #[test]
    fn test_report_serializes_type_field() {
        let mut book = ReportBook::new();
        let report = book.generate_engagement_report(&[], &TaskBuckets::default(), Utc::now());
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["type"], "Engagement");
        assert!(value.get("generatedDate").is_some());
    }
}
