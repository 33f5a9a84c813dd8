//! Demo script runner
//!
//! Runs one local script and reports what it printed as a small JSON
//! document: `{ "success": true, "output": ... }` or
//! `{ "success": false, "error": ... }`.

use crate::config::DemoConfig;
use crate::error::Result;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Outcome of a demo run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoReport {
    pub success: bool,
    /// Trimmed standard output, on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Standard error, or the reason the script could not be started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DemoReport {
    fn succeeded(output: String) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error),
        }
    }
}

/// Run `script` with `interpreter` and capture the result
///
/// Anything written to stderr counts as failure, even with a zero exit
/// status. A non-zero exit with an empty stderr is also a failure.
pub async fn run_script(interpreter: &str, script: &Path) -> DemoReport {
    tracing::info!(
        interpreter = %interpreter,
        script = %script.display(),
        "Running demo script"
    );

    let output = match Command::new(interpreter).arg(script).output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Failed to start demo script: {}", e);
            return DemoReport::failed(format!("Failed to execute script: {}", e));
        }
    };

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        return DemoReport::failed(stderr.into_owned());
    }
    if !output.status.success() {
        return DemoReport::failed(format!("Script exited with {}", output.status));
    }

    DemoReport::succeeded(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run the configured (or given) script and print the JSON report
///
/// # Errors
///
/// Returns an error after printing the report if the script failed.
pub async fn run_demo(config: &DemoConfig, script: Option<PathBuf>) -> Result<()> {
    let script = script.unwrap_or_else(|| PathBuf::from(&config.script));
    let report = run_script(&config.interpreter, &script).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.success {
        anyhow::bail!("Demo script failed");
    }
    Ok(())
}
