//! Output formatting for CLI commands.
//!
//! Results go to stdout so they can be piped; progress and logs go to stderr.

use colored::Colorize;
use std::fmt::Write as _;
use std::io::Write;
use tabled::{Table, Tabled};

use crate::config::{ArtifactHasher, ValidationResult};
use crate::deployer::{ApplyReport, DeploymentCheck};
use crate::error::DeployError;
use crate::jboss::RemoteDeploymentState;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Deployment status row for table display.
#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Deployment")]
    name: String,
    #[tabled(rename = "Remote")]
    remote: String,
    #[tabled(rename = "Local")]
    local: String,
    #[tabled(rename = "In sync")]
    in_sync: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of a deploy run.
    #[must_use]
    pub fn format_report(&self, report: &ApplyReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                for deployment in &report.deployments {
                    if deployment.changed {
                        let _ = writeln!(output, "{} {} deployed", "~".yellow(), deployment.name);
                    } else {
                        let _ = writeln!(output, "{} {} up to date", "✓".green(), deployment.name);
                    }
                }

                let summary = if report.changed {
                    "changed".yellow().to_string()
                } else {
                    "unchanged".green().to_string()
                };
                let _ = writeln!(output, "\nResult: {summary}");
                output
            }
        }
    }

    /// Formats a read-only check: which deployments would change.
    #[must_use]
    pub fn format_check(&self, checks: &[DeploymentCheck]) -> String {
        let would_change: Vec<&DeploymentCheck> =
            checks.iter().filter(|c| c.needs_deploy()).collect();

        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "changed": !would_change.is_empty(),
                    "deployments": checks
                        .iter()
                        .map(|c| serde_json::json!({ "name": c.name, "changed": c.needs_deploy() }))
                        .collect::<Vec<_>>(),
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                if would_change.is_empty() {
                    return format!(
                        "{} No changes required - all deployments are up to date.\n",
                        "✓".green()
                    );
                }

                let mut output = String::new();
                for check in &would_change {
                    let _ = writeln!(
                        output,
                        "{} {} ({})",
                        "~would deploy".yellow(),
                        check.name,
                        Self::describe_remote(&check.remote)
                    );
                }
                let _ = write!(
                    output,
                    "\n{} of {} deployment(s) would change\n",
                    would_change.len(),
                    checks.len()
                );
                output
            }
        }
    }

    /// Formats the status table.
    #[must_use]
    pub fn format_status(&self, checks: &[DeploymentCheck]) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(checks).unwrap_or_default(),
            OutputFormat::Text => {
                if checks.is_empty() {
                    return String::from("No deployments configured.\n");
                }

                let rows: Vec<StatusRow> = checks
                    .iter()
                    .map(|c| StatusRow {
                        name: c.name.clone(),
                        remote: Self::describe_remote(&c.remote),
                        local: c
                            .local_hash
                            .as_deref()
                            .map_or_else(|| String::from("unreadable"), ArtifactHasher::short_hash),
                        in_sync: if c.in_sync {
                            "yes".green().to_string()
                        } else {
                            "no".red().to_string()
                        },
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }

    /// Formats validation results.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("{} Configuration is valid!\n", "✓".green());
                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }
                output
            }
        }
    }

    /// Formats a failure.
    ///
    /// In JSON mode the message field carries the error text unchanged.
    #[must_use]
    pub fn format_failure(&self, error: &DeployError) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "failed": true, "msg": error.to_string() });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {error}", "Error:".red()),
        }
    }

    /// Writes a formatted result to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn emit(&self, text: &str) -> std::io::Result<()> {
        write_line(&mut std::io::stdout().lock(), text)
    }

    /// Reports a failure: JSON on stdout, text on stderr.
    ///
    /// If stdout cannot be written, the message goes to stderr instead.
    pub fn emit_failure(&self, error: &DeployError) {
        self.write_failure(
            error,
            &mut std::io::stdout().lock(),
            &mut std::io::stderr().lock(),
        );
    }

    fn write_failure(&self, error: &DeployError, stdout: &mut impl Write, stderr: &mut impl Write) {
        let message = self.format_failure(error);
        let written = match self.format {
            OutputFormat::Json => write_line(stdout, &message),
            OutputFormat::Text => write_line(stderr, &message),
        };
        if written.is_err() {
            // Nowhere left to report to
            let _ = write_line(stderr, &message);
        }
    }

    /// Short description of a remote state.
    fn describe_remote(remote: &RemoteDeploymentState) -> String {
        match remote {
            RemoteDeploymentState::Absent => String::from("absent"),
            RemoteDeploymentState::Unreadable { exit_code, .. } => {
                format!("unreadable (exit {exit_code})")
            }
            RemoteDeploymentState::Present { checksum } => ArtifactHasher::short_hash(checksum),
        }
    }
}

/// Writes `text` followed by a newline if it lacks one.
fn write_line(writer: &mut impl Write, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployer::DeploymentResult;
    use crate::error::CliError;
    use std::path::PathBuf;

    fn create_check(name: &str, in_sync: bool) -> DeploymentCheck {
        DeploymentCheck {
            name: name.to_string(),
            src: PathBuf::from(format!("/tmp/{name}")),
            remote: RemoteDeploymentState::Present {
                checksum: String::from("5e1b0f6a398c2df34b1120a7e2094c701f336d00"),
            },
            local_hash: Some(String::from("5e1b0f6a398c2df34b1120a7e2094c701f336d00")),
            in_sync,
        }
    }

    #[test]
    fn test_report_json() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let report = ApplyReport {
            changed: true,
            deployments: vec![DeploymentResult {
                name: String::from("hello.war"),
                changed: true,
            }],
        };

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_report(&report)).expect("valid json");
        assert_eq!(value["changed"], true);
        assert_eq!(value["deployments"][0]["name"], "hello.war");
    }

    #[test]
    fn test_check_json_counts_changes() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let checks = vec![create_check("a.war", true), create_check("b.war", false)];

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_check(&checks)).expect("valid json");
        assert_eq!(value["changed"], true);
        assert_eq!(value["deployments"][0]["changed"], false);
        assert_eq!(value["deployments"][1]["changed"], true);
    }

    #[test]
    fn test_check_text_up_to_date() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let output = formatter.format_check(&[create_check("a.war", true)]);

        assert!(output.contains("No changes required"));
    }

    #[test]
    fn test_status_text_table() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let output = formatter.format_status(&[create_check("hello.war", true)]);

        assert!(output.contains("hello.war"));
        assert!(output.contains("5e1b0f6a"));
    }

    #[test]
    fn test_failure_json_keeps_stderr() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let error = DeployError::from(CliError::deploy_failed("hello.war", "WFLYCTL0062: failed\n"));

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_failure(&error)).expect("valid json");
        assert_eq!(value["failed"], true);
        assert_eq!(value["msg"], "WFLYCTL0062: failed\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_failure_falls_back_to_stderr() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let error = DeployError::from(CliError::deploy_failed("hello.war", "WFLYCTL0062: failed"));
        let mut stderr = Vec::new();

        formatter.write_failure(&error, &mut ClosedPipe, &mut stderr);

        let value: serde_json::Value =
            serde_json::from_slice(&stderr).expect("valid json on stderr");
        assert_eq!(value["msg"], "WFLYCTL0062: failed");
    }

    #[test]
    fn test_text_failure_goes_to_stderr() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let error = DeployError::from(CliError::deploy_failed("hello.war", "boom"));
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        formatter.write_failure(&error, &mut stdout, &mut stderr);

        assert!(stdout.is_empty());
        assert!(String::from_utf8_lossy(&stderr).contains("boom"));
    }
}
