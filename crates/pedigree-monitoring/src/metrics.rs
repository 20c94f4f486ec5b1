//! Counters and histograms for the pedigree engine and its HTTP surface.
//!
//! Everything goes through the `metrics` facade, so the values are dropped
//! until the host installs a recorder. Each call also leaves a log line.

use metrics::{counter, histogram};
use tracing::{debug, info};

/// Pedigree-specific metrics
pub struct PedigreeMetrics;

impl PedigreeMetrics {
    /// Record a completed expansion
    pub fn record_expansion(direction: &'static str) {
        counter!("pedigree_expansions_total", 1, "direction" => direction);
        debug!(direction, "Expansion recorded");
    }

    /// Record a click that produced no expansion
    pub fn record_ignored_click(reason: &'static str) {
        counter!("pedigree_ignored_clicks_total", 1, "reason" => reason);
        debug!(reason, "Ignored click recorded");
    }

    /// Record a manual link
    pub fn record_manual_link() {
        counter!("pedigree_manual_links_total", 1);
    }

    /// Record a completed cascade deletion
    pub fn record_cascade(records: usize, nodes: usize, edges: usize) {
        counter!("pedigree_cascade_deletions_total", 1);
        counter!("pedigree_cascade_removed_records_total", records as u64);
        counter!("pedigree_cascade_removed_nodes_total", nodes as u64);
        counter!("pedigree_cascade_removed_edges_total", edges as u64);
        info!(records, nodes, edges, "Cascade recorded");
    }

    /// Record a declined deletion prompt
    pub fn record_declined_deletion() {
        counter!("pedigree_declined_deletions_total", 1);
    }

    /// Record a delete request on an edge that is not a live lineage record
    pub fn record_stale_delete() {
        counter!("pedigree_stale_deletes_total", 1);
    }

    /// Record a document import attempt
    pub fn record_import(success: bool) {
        let outcome = if success { "success" } else { "rejected" };
        counter!("pedigree_imports_total", 1, "outcome" => outcome);
        info!(outcome, "Document import recorded");
    }

    /// Record HTTP request
    pub fn record_http_request(path: &str, method: &str, status_code: u16, duration_ms: f64) {
        counter!(
            "pedigree_http_requests_total",
            1,
            "path" => path.to_string(),
            "method" => method.to_string(),
            "status" => status_code.to_string()
        );
        histogram!(
            "pedigree_http_request_duration_ms",
            duration_ms,
            "path" => path.to_string(),
            "method" => method.to_string()
        );
        info!(
            path,
            method,
            status = status_code,
            duration_ms,
            "HTTP request"
        );
    }
}
