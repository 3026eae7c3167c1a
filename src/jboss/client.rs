//! Client for the administrative CLI (`jboss-cli.sh`).
//!
//! Every call spawns the CLI once in non-interactive mode:
//!
//! ```text
//! jboss-cli.sh --connect --controller=HOST:PORT --user=USER --password=PASS \
//!     --commands=CMD1,CMD2,...
//! ```

use std::path::Path;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::Result;

use super::remote::RemoteDeploymentState;
use super::runner::{CommandOutput, CommandRunner, ProcessRunner};

/// Prefix of the password argument.
const PASSWORD_FLAG: &str = "--password=";

/// Client for the administrative CLI.
#[derive(Debug)]
pub struct JbossCli<R = ProcessRunner> {
    /// Management connection settings.
    server: ServerConfig,
    /// Runner used to spawn the CLI.
    runner: R,
}

impl JbossCli<ProcessRunner> {
    /// Creates a client that spawns real processes.
    #[must_use]
    pub const fn new(server: ServerConfig) -> Self {
        Self {
            server,
            runner: ProcessRunner::new(),
        }
    }
}

impl<R: CommandRunner> JbossCli<R> {
    /// Creates a client with a custom runner.
    #[must_use]
    pub const fn with_runner(server: ServerConfig, runner: R) -> Self {
        Self { server, runner }
    }

    /// Builds the argument vector for a batch of commands.
    #[must_use]
    pub fn build_args(&self, commands: &[String]) -> Vec<String> {
        vec![
            String::from("--connect"),
            format!("--controller={}", self.server.controller()),
            format!("--user={}", self.server.user),
            format!("{PASSWORD_FLAG}{}", self.server.password),
            format!("--commands={}", commands.join(",")),
        ]
    }

    /// Runs a batch of commands in one CLI invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the CLI process cannot be started.
    pub async fn run_commands(&self, commands: &[String]) -> Result<CommandOutput> {
        let args = self.build_args(commands);
        debug!(
            "Running {} {}",
            self.server.cli_path.display(),
            redact_args(&args).join(" ")
        );

        self.runner.run(&self.server.cli_path, &args).await
    }

    /// Queries the server for a deployment's current state.
    ///
    /// # Errors
    ///
    /// Returns an error only if the CLI process cannot be started.
    pub async fn read_deployment(&self, name: &str) -> Result<RemoteDeploymentState> {
        let output = self.run_commands(&[read_resource_command(name)]).await?;
        let state = RemoteDeploymentState::from_read_output(&output);
        debug!("Deployment {name} is {state}");
        Ok(state)
    }

    /// Force-deploys an archive under the given name.
    ///
    /// The exit status is left to the caller to interpret.
    ///
    /// # Errors
    ///
    /// Returns an error only if the CLI process cannot be started.
    pub async fn deploy(&self, name: &str, src: &Path) -> Result<CommandOutput> {
        info!("Deploying {} as {name}", src.display());
        self.run_commands(&[deploy_command(name, src)]).await
    }
}

/// Builds the read-resource command for a deployment.
#[must_use]
pub fn read_resource_command(name: &str) -> String {
    format!("/deployment={name}:read-resource")
}

/// Builds the forced deploy command for a deployment.
#[must_use]
pub fn deploy_command(name: &str, src: &Path) -> String {
    format!("deploy --name={name} {} --force", src.display())
}

/// Masks the password argument for logging.
#[must_use]
pub fn redact_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if arg.starts_with(PASSWORD_FLAG) {
                format!("{PASSWORD_FLAG}********")
            } else {
                arg.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn create_test_server() -> ServerConfig {
        ServerConfig {
            cli_path: PathBuf::from("/opt/jboss-as/bin/jboss-cli.sh"),
            host: String::from("192.168.0.5"),
            port: 9999,
            user: String::from("admin"),
            password: String::from("seceret"),
        }
    }

    #[test]
    fn test_build_args_shape() {
        let cli = JbossCli::new(create_test_server());
        let args = cli.build_args(&[
            read_resource_command("hello.war"),
            String::from(":read-attribute(name=server-state)"),
        ]);

        assert_eq!(
            args,
            vec![
                "--connect",
                "--controller=192.168.0.5:9999",
                "--user=admin",
                "--password=seceret",
                "--commands=/deployment=hello.war:read-resource,:read-attribute(name=server-state)",
            ]
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            read_resource_command("hello.war"),
            "/deployment=hello.war:read-resource"
        );
        assert_eq!(
            deploy_command("hello.war", Path::new("/tmp/hello-1.0-SNAPSHOT.war")),
            "deploy --name=hello.war /tmp/hello-1.0-SNAPSHOT.war --force"
        );
    }

    #[test]
    fn test_redact_args() {
        let cli = JbossCli::new(create_test_server());
        let redacted = redact_args(&cli.build_args(&[String::from("ls")])).join(" ");

        assert!(!redacted.contains("seceret"));
        assert!(redacted.contains("--password=********"));
        assert!(redacted.contains("--user=admin"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_against_fake_cli_script() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let script = dir.path().join("jboss-cli.sh");
        let log = dir.path().join("calls.log");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> {log}\ncase \"$5\" in\n  *read-resource*) echo '{{\"outcome\" => \"success\", \"result\" => {{\"content\" => [{{\"hash\" => bytes {{0xab, 0xc1, 0x23}}}}]}}}}' ;;\n  *) echo 'deploy rejected' >&2; exit 1 ;;\nesac\n",
                log = log.display()
            ),
        )
        .expect("Failed to write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");

        let mut server = create_test_server();
        server.cli_path = script;
        let cli = JbossCli::new(server);

        let state = cli.read_deployment("hello.war").await.expect("read should run");
        assert_eq!(state.checksum(), Some("abc123"));

        let output = cli
            .deploy("hello.war", Path::new("/tmp/hello.war"))
            .await
            .expect("deploy should run");
        assert_eq!(output.exit_code, 1);
        assert_eq!(output.stderr, "deploy rejected\n");

        let calls = std::fs::read_to_string(&log).expect("calls should be logged");
        assert!(calls.contains("--controller=192.168.0.5:9999"));
        assert!(calls.contains("--commands=deploy --name=hello.war /tmp/hello.war --force"));
    }
}
