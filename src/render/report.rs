//! Report JSON generation.

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::domain::{BranchSpec, REPORT_SCHEMA_VERSION};
use crate::publish::PublishReport;
use crate::scan::Collection;

/// Everything a finished run knows about itself.
pub struct RunSummary<'a> {
    pub repo: &'a str,
    pub branches: &'a BranchSpec,
    pub publish: &'a PublishReport,
    /// Present when the run collected the repository itself.
    pub collection: Option<&'a Collection>,
}

pub fn build_report(summary: &RunSummary<'_>, include_timestamp: bool) -> Result<Value> {
    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("repo".to_string(), Value::String(summary.repo.to_string()));
    report.insert("branches".to_string(), serde_json::to_value(summary.branches)?);
    report.insert("pull_request".to_string(), serde_json::to_value(&summary.publish.pull_request)?);
    report.insert("files".to_string(), serde_json::to_value(&summary.publish.writes)?);
    report.insert("comment_posted".to_string(), Value::Bool(summary.publish.comment_posted()));
    if let Some(err) = &summary.publish.comment_error {
        report.insert("comment_error".to_string(), Value::String(err.clone()));
    }
    if let Some(collection) = summary.collection {
        report.insert(
            "collection".to_string(),
            json!({
                "files": collection.files.len(),
                "excluded": collection.excluded,
                "skipped": collection.skipped,
            }),
        );
    }
    Ok(Value::Object(report))
}

pub fn write_report(report_path: &Path, summary: &RunSummary<'_>, include_timestamp: bool) -> Result<()> {
    let report = build_report(summary, include_timestamp)?;
    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
