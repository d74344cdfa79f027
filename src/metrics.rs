use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{EtlError, Result};

/// Install the global Prometheus recorder for this process.
///
/// A batch run exits too quickly to be scraped, so nothing listens; the
/// handle renders the collected metrics once the run is over. Without this
/// call the pipeline's `counter!`/`histogram!` calls are no-ops, which is what
/// library users get unless they install a recorder of their own.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EtlError::Metrics(e.to_string()))
}

/// Write the current metrics in Prometheus text format, e.g. for a
/// node_exporter textfile collector
pub fn write_snapshot<P: AsRef<Path>>(handle: &PrometheusHandle, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, handle.render())?;
    info!("[metrics] Wrote snapshot to {}", path.display());
    Ok(())
}
