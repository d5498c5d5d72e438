//! Prometheus metrics for s3file.
//!
//! Defines metric name constants, installs a global Prometheus recorder
//! using `metrics-exporter-prometheus`, and provides the small recording
//! helpers the coordinator calls after each lifecycle operation.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::warn;

// -- Metric name constants ----------------------------------------------------

/// Lifecycle operations (counter). Labels: operation, status.
pub const FILE_OPERATIONS_TOTAL: &str = "s3file_operations_total";

/// Total payload bytes uploaded (counter).
pub const BYTES_UPLOADED_TOTAL: &str = "s3file_bytes_uploaded_total";

/// Remote objects left behind without a record (counter). Labels: cause.
pub const ORPHANED_OBJECTS_TOTAL: &str = "s3file_orphaned_objects_total";

// -- Global recorder installation ---------------------------------------------

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus metrics recorder. Idempotent -- safe to call
/// multiple times (e.g. in tests). Returns a reference to the global handle.
pub fn init_metrics() -> &'static PrometheusHandle {
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            warn!("Another metrics recorder is already installed; s3file metrics will not be exported");
        }
        describe_metrics();
        handle
    })
}

/// Register metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!(FILE_OPERATIONS_TOTAL, "File lifecycle operations by type and outcome");
    describe_counter!(BYTES_UPLOADED_TOTAL, "Total payload bytes uploaded to object storage");
    describe_counter!(
        ORPHANED_OBJECTS_TOTAL,
        "Remote objects left without a matching record"
    );
}

/// Render the Prometheus exposition text, if the recorder is installed.
pub fn render() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(PrometheusHandle::render)
}

// -- Recording helpers --------------------------------------------------------

pub(crate) fn record_operation(operation: &'static str, status: &'static str) {
    counter!(FILE_OPERATIONS_TOTAL, "operation" => operation, "status" => status).increment(1);
}

pub(crate) fn record_upload(bytes: u64) {
    counter!(BYTES_UPLOADED_TOTAL).increment(bytes);
}

pub(crate) fn record_orphan(cause: &'static str) {
    counter!(ORPHANED_OBJECTS_TOTAL, "cause" => cause).increment(1);
}

// -- Tests --------------------------------------------------------------------
