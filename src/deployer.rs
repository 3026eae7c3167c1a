//! Idempotent check-and-deploy.
//!
//! For each target the deployer reads the deployment from the server,
//! compares the reported content hash with the SHA-1 of the local archive,
//! and only issues a forced deploy when they differ.
//!
//! A read that fails for any reason counts as "not deployed". This also
//! covers an unreachable server or rejected credentials, which then surface
//! through the deploy command instead. Such reads are logged at `warn`.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::config::{ArtifactHasher, DeploymentTarget};
use crate::error::{CliError, Result};
use crate::jboss::{CommandRunner, JbossCli, ProcessRunner, RemoteDeploymentState};

/// Checks deployments and deploys archives whose content differs.
#[derive(Debug, Default)]
pub struct Deployer<R = ProcessRunner> {
    /// Runner shared by every CLI invocation.
    runner: R,
    /// Local archive hasher.
    hasher: ArtifactHasher,
}

/// Outcome of deploying one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployOutcome {
    /// Content already matched; nothing was run.
    Unchanged,
    /// The deploy command succeeded.
    Deployed,
}

/// Per-deployment entry of an apply run.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentResult {
    /// Deployment name.
    pub name: String,
    /// Whether the deployment changed.
    pub changed: bool,
}

/// Result of applying every target.
#[derive(Debug, Default, Serialize)]
pub struct ApplyReport {
    /// True if any deployment changed.
    pub changed: bool,
    /// Outcomes in the order targets were applied.
    pub deployments: Vec<DeploymentResult>,
}

/// Read-only comparison of a deployment with its local archive.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentCheck {
    /// Deployment name.
    pub name: String,
    /// Local archive path.
    pub src: PathBuf,
    /// State reported by the server.
    pub remote: RemoteDeploymentState,
    /// SHA-1 of the local archive, if it could be read.
    pub local_hash: Option<String>,
    /// Whether the remote checksum equals the local hash.
    pub in_sync: bool,
}

impl Deployer<ProcessRunner> {
    /// Creates a deployer that spawns the real CLI.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_runner(ProcessRunner::new())
    }
}

impl<R: CommandRunner> Deployer<R> {
    /// Creates a deployer with a custom runner.
    #[must_use]
    pub const fn with_runner(runner: R) -> Self {
        Self {
            runner,
            hasher: ArtifactHasher::new(),
        }
    }

    /// Builds a CLI client for the target's server.
    fn client(&self, target: &DeploymentTarget) -> JbossCli<&R> {
        JbossCli::with_runner(target.server.clone(), &self.runner)
    }

    /// Checks whether the target is deployed with matching content.
    ///
    /// # Errors
    ///
    /// Returns an error only if the CLI cannot be started.
    pub async fn is_deployed(&self, target: &DeploymentTarget) -> Result<bool> {
        let remote = self.client(target).read_deployment(&target.name).await?;
        let check = self.compare(target, remote, false);
        Ok(check.in_sync)
    }

    /// Deploys the target unless it is already deployed.
    ///
    /// # Errors
    ///
    /// Returns an error if the CLI cannot be started, or if the deploy
    /// command fails; the latter carries the CLI's error output verbatim.
    pub async fn deploy_if_needed(
        &self,
        target: &DeploymentTarget,
        deployed: bool,
    ) -> Result<DeployOutcome> {
        if deployed {
            info!("{} is up to date", target.name);
            return Ok(DeployOutcome::Unchanged);
        }

        let output = self.client(target).deploy(&target.name, &target.src).await?;
        if output.success() {
            info!("Deployed {}", target.name);
            Ok(DeployOutcome::Deployed)
        } else {
            error!(
                "Deploy of {} failed with exit code {}",
                target.name, output.exit_code
            );
            Err(CliError::deploy_failed(&target.name, output.stderr).into())
        }
    }

    /// Checks the target and deploys it if needed.
    ///
    /// # Errors
    ///
    /// See [`Self::deploy_if_needed`].
    pub async fn apply(&self, target: &DeploymentTarget) -> Result<DeployOutcome> {
        let deployed = self.is_deployed(target).await?;
        self.deploy_if_needed(target, deployed).await
    }

    /// Applies every target in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failure; later targets are not touched.
    pub async fn apply_all(&self, targets: &[DeploymentTarget]) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        for target in targets {
            let outcome = self.apply(target).await?;
            let changed = outcome.changed();
            report.changed |= changed;
            report.deployments.push(DeploymentResult {
                name: target.name.clone(),
                changed,
            });
        }

        debug!(
            "Applied {} deployment(s), changed: {}",
            report.deployments.len(),
            report.changed
        );
        Ok(report)
    }

    /// Compares the target with the server without deploying anything.
    ///
    /// # Errors
    ///
    /// Returns an error only if the CLI cannot be started.
    pub async fn inspect(&self, target: &DeploymentTarget) -> Result<DeploymentCheck> {
        let remote = self.client(target).read_deployment(&target.name).await?;
        Ok(self.compare(target, remote, true))
    }

    /// Compares a remote state with the local archive.
    ///
    /// The archive is only hashed when the server reported a checksum,
    /// unless `always_hash` is set.
    fn compare(
        &self,
        target: &DeploymentTarget,
        remote: RemoteDeploymentState,
        always_hash: bool,
    ) -> DeploymentCheck {
        match &remote {
            RemoteDeploymentState::Absent => {
                debug!("{} is not deployed", target.name);
            }
            RemoteDeploymentState::Unreadable { exit_code, reason } => {
                warn!(
                    "Could not read deployment {} (exit {exit_code}): {reason}; treating it as not deployed",
                    target.name
                );
            }
            RemoteDeploymentState::Present { .. } => {}
        }

        let local_hash = if always_hash || remote.is_present() {
            match self.hasher.sha1_file(&target.src) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    warn!("Cannot hash {}: {e}", target.src.display());
                    None
                }
            }
        } else {
            None
        };

        let in_sync = match (remote.checksum(), local_hash.as_deref()) {
            (Some(remote_hash), Some(local)) => ArtifactHasher::hashes_match(remote_hash, local),
            _ => false,
        };

        if remote.is_present() && !in_sync {
            info!("{} is deployed with different content", target.name);
        }

        DeploymentCheck {
            name: target.name.clone(),
            src: target.src.clone(),
            remote,
            local_hash,
            in_sync,
        }
    }
}

impl DeployOutcome {
    /// Returns true if the deploy command ran.
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Deployed)
    }
}

impl DeploymentCheck {
    /// Returns true if applying this target would run the deploy command.
    #[must_use]
    pub const fn needs_deploy(&self) -> bool {
        !self.in_sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::error::DeployError;
    use crate::jboss::CommandOutput;
    use async_trait::async_trait;
    use mockall::mock;
    use std::io::Write;
    use std::path::Path;

    mock! {
        Runner {}

        #[async_trait]
        impl CommandRunner for Runner {
            async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput>;
        }
    }

    fn is_read(args: &[String]) -> bool {
        args.last().is_some_and(|a| a.contains(":read-resource"))
    }

    fn is_deploy(args: &[String]) -> bool {
        args.last().is_some_and(|a| a.starts_with("--commands=deploy "))
    }

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    /// Renders a hex hash the way the server prints content hashes.
    fn read_response(hex_hash: &str) -> String {
        let bytes: Vec<String> = hex_hash
            .as_bytes()
            .chunks(2)
            .map(|pair| format!("0x{}", String::from_utf8_lossy(pair)))
            .collect();
        format!(
            "{{\n    \"outcome\" => \"success\",\n    \"result\" => {{\n        \"content\" => [{{\"hash\" => bytes {{\n            {}\n        }}}}],\n        \"enabled\" => true,\n        \"name\" => \"hello.war\"\n    }}\n}}",
            bytes.join(",\n            ")
        )
    }

    fn create_artifact(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write artifact");
        file
    }

    fn create_target(src: &Path) -> DeploymentTarget {
        DeploymentTarget {
            name: String::from("hello.war"),
            src: src.to_path_buf(),
            server: ServerConfig {
                cli_path: PathBuf::from("/opt/jboss-as/bin/jboss-cli.sh"),
                ..ServerConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn test_matching_checksum_is_unchanged() {
        let artifact = create_artifact(b"hello world archive");
        let hash = ArtifactHasher::new().sha1_bytes(b"hello world archive");
        let response = read_response(&hash);

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(move |_, _| Ok(output(0, &response, "")));
        runner.expect_run().withf(|_, args| is_deploy(args)).never();

        let deployer = Deployer::with_runner(runner);
        let outcome = deployer
            .apply(&create_target(artifact.path()))
            .await
            .expect("apply should succeed");

        assert_eq!(outcome, DeployOutcome::Unchanged);
        assert!(!outcome.changed());
    }

    #[tokio::test]
    async fn test_absent_deployment_is_deployed() {
        let artifact = create_artifact(b"new archive");

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(|_, _| {
                Ok(output(
                    1,
                    "{\"outcome\" => \"failed\", \"failure-description\" => \"WFLYCTL0216: Management resource not found\"}",
                    "",
                ))
            });
        runner
            .expect_run()
            .withf(|_, args| is_deploy(args))
            .times(1)
            .returning(|_, _| Ok(output(0, "", "")));

        let deployer = Deployer::with_runner(runner);
        let outcome = deployer
            .apply(&create_target(artifact.path()))
            .await
            .expect("apply should succeed");

        assert_eq!(outcome, DeployOutcome::Deployed);
    }

    #[tokio::test]
    async fn test_mismatched_checksum_is_deployed() {
        let artifact = create_artifact(b"version 2");
        let stale = ArtifactHasher::new().sha1_bytes(b"version 1");
        let response = read_response(&stale);

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(move |_, _| Ok(output(0, &response, "")));
        runner
            .expect_run()
            .withf(|_, args| is_deploy(args))
            .times(1)
            .returning(|_, _| Ok(output(0, "", "")));

        let deployer = Deployer::with_runner(runner);
        let target = create_target(artifact.path());

        assert!(!deployer.is_deployed(&target).await.expect("check should run"));
        let outcome = deployer
            .deploy_if_needed(&target, false)
            .await
            .expect("deploy should succeed");
        assert!(outcome.changed());
    }

    #[tokio::test]
    async fn test_missing_checksum_pattern_is_not_deployed() {
        let artifact = create_artifact(b"archive");

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(|_, _| Ok(output(0, "{\"outcome\" => \"success\", \"result\" => {}}", "")));

        let deployer = Deployer::with_runner(runner);
        let deployed = deployer
            .is_deployed(&create_target(artifact.path()))
            .await
            .expect("check should not fail");

        assert!(!deployed);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_not_deployed() {
        let artifact = create_artifact(b"archive");

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(|_, _| {
                Ok(output(
                    1,
                    "",
                    "Failed to connect to the controller: The controller is not available at localhost:9999",
                ))
            });

        let deployer = Deployer::with_runner(runner);
        let check = deployer
            .inspect(&create_target(artifact.path()))
            .await
            .expect("inspect should not fail");

        assert!(matches!(check.remote, RemoteDeploymentState::Unreadable { exit_code: 1, .. }));
        assert!(check.local_hash.is_some());
        assert!(check.needs_deploy());
    }

    #[tokio::test]
    async fn test_deploy_failure_carries_stderr_verbatim() {
        let stderr = "WFLYCTL0062: Composite operation failed and was rolled back.\n";

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_deploy(args))
            .times(1)
            .returning(move |_, _| Ok(output(1, "", stderr)));

        let deployer = Deployer::with_runner(runner);
        let err = deployer
            .deploy_if_needed(&create_target(Path::new("/tmp/hello.war")), false)
            .await
            .expect_err("deploy should fail");

        assert!(err.is_deploy_failure());
        assert_eq!(err.to_string(), stderr);
    }

    #[tokio::test]
    async fn test_already_deployed_runs_nothing() {
        let mut runner = MockRunner::new();
        runner.expect_run().never();

        let deployer = Deployer::with_runner(runner);
        let outcome = deployer
            .deploy_if_needed(&create_target(Path::new("/tmp/hello.war")), true)
            .await
            .expect("no-op should succeed");

        assert_eq!(outcome, DeployOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_missing_local_artifact_is_not_deployed() {
        let response = read_response("abc123");

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(move |_, _| Ok(output(0, &response, "")));

        let deployer = Deployer::with_runner(runner);
        let deployed = deployer
            .is_deployed(&create_target(Path::new("/nonexistent/hello.war")))
            .await
            .expect("check should not fail");

        assert!(!deployed);
    }

    #[tokio::test]
    async fn test_apply_all_stops_at_first_failure() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(|_, _| Ok(output(1, "", "WFLYCTL0216: not found")));
        runner
            .expect_run()
            .withf(|_, args| is_deploy(args))
            .times(1)
            .returning(|_, _| Ok(output(1, "", "boom")));

        let deployer = Deployer::with_runner(runner);
        let first = create_target(Path::new("/tmp/a.war"));
        let mut second = create_target(Path::new("/tmp/b.war"));
        second.name = String::from("b.war");

        let result = deployer.apply_all(&[first, second]).await;
        assert!(matches!(
            result,
            Err(DeployError::Cli(CliError::DeployFailed { ref deployment, .. })) if deployment == "hello.war"
        ));
    }

    #[tokio::test]
    async fn test_apply_all_reports_changes() {
        let artifact = create_artifact(b"same");
        let hash = ArtifactHasher::new().sha1_bytes(b"same");
        let response = read_response(&hash);

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| args.last().is_some_and(|a| a.contains("/deployment=hello.war:")))
            .times(1)
            .returning(move |_, _| Ok(output(0, &response, "")));
        runner
            .expect_run()
            .withf(|_, args| args.last().is_some_and(|a| a.contains("/deployment=b.war:")))
            .times(1)
            .returning(|_, _| Ok(output(1, "", "WFLYCTL0216: not found")));
        runner
            .expect_run()
            .withf(|_, args| args.last().is_some_and(|a| a.contains("--name=b.war")))
            .times(1)
            .returning(|_, _| Ok(output(0, "", "")));

        let deployer = Deployer::with_runner(runner);
        let first = create_target(artifact.path());
        let mut second = create_target(artifact.path());
        second.name = String::from("b.war");

        let report = deployer
            .apply_all(&[first, second])
            .await
            .expect("apply should succeed");

        assert!(report.changed);
        assert!(!report.deployments[0].changed);
        assert!(report.deployments[1].changed);

        let json = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(json["changed"], true);
        assert_eq!(json["deployments"][1]["name"], "b.war");
    }

    #[tokio::test]
    async fn test_inspect_reports_both_hashes() {
        let artifact = create_artifact(b"rebuilt archive");
        let local = ArtifactHasher::new().sha1_bytes(b"rebuilt archive");
        let response = read_response("5e1b0f6a398c2df34b1120a7e2094c701f336d00");

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(move |_, _| Ok(output(0, &response, "")));
        runner.expect_run().withf(|_, args| is_deploy(args)).never();

        let deployer = Deployer::with_runner(runner);
        let check = deployer
            .inspect(&create_target(artifact.path()))
            .await
            .expect("inspect should succeed");

        assert_eq!(
            check.remote.checksum(),
            Some("5e1b0f6a398c2df34b1120a7e2094c701f336d00")
        );
        assert_eq!(check.local_hash.as_deref(), Some(local.as_str()));
        assert!(!check.in_sync);
        assert!(check.needs_deploy());
    }

    #[tokio::test]
    async fn test_inspect_absent_still_hashes_local() {
        let artifact = create_artifact(b"fresh archive");

        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, args| is_read(args))
            .times(1)
            .returning(|_, _| Ok(output(1, "", "WFLYCTL0216: Management resource not found")));

        let deployer = Deployer::with_runner(runner);
        let check = deployer
            .inspect(&create_target(artifact.path()))
            .await
            .expect("inspect should succeed");

        assert_eq!(check.remote, RemoteDeploymentState::Absent);
        assert!(check.local_hash.is_some());
        assert!(check.needs_deploy());
    }
}
