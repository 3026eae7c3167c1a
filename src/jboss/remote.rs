//! Remote deployment state as reported by a read-resource query.

use serde::Serialize;
use std::fmt;

use super::model::{checksum_from_output, ModelNode};
use super::runner::CommandOutput;

/// Failure codes the server uses for a management resource that does not exist.
const NOT_FOUND_MARKERS: &[&str] = &["WFLYCTL0216", "JBAS014807", "not found"];

/// What the server reports about a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RemoteDeploymentState {
    /// The server answered that the deployment does not exist.
    Absent,
    /// The query failed for another reason, or the response had no checksum.
    Unreadable {
        /// Exit code of the read command.
        exit_code: i32,
        /// First line of the error output, or a description of the shape mismatch.
        reason: String,
    },
    /// The deployment exists with the given content checksum (lowercase hex).
    Present {
        /// Content checksum.
        checksum: String,
    },
}

impl RemoteDeploymentState {
    /// Classifies the output of `/deployment=<name>:read-resource`.
    #[must_use]
    pub fn from_read_output(output: &CommandOutput) -> Self {
        if !output.success() {
            if is_not_found(output) {
                return Self::Absent;
            }
            return Self::Unreadable {
                exit_code: output.exit_code,
                reason: first_line(&output.stderr)
                    .or_else(|| first_line(&output.stdout))
                    .unwrap_or("no output")
                    .to_string(),
            };
        }

        checksum_from_output(&output.stdout).map_or_else(
            || Self::Unreadable {
                exit_code: output.exit_code,
                reason: String::from("response contains no content hash"),
            },
            |checksum| Self::Present { checksum },
        )
    }

    /// Returns the remote checksum, if present.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        match self {
            Self::Present { checksum } => Some(checksum),
            _ => None,
        }
    }

    /// Returns true if the server reported content for the deployment.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

impl fmt::Display for RemoteDeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Unreadable { exit_code, reason } => {
                write!(f, "unreadable (exit {exit_code}): {reason}")
            }
            Self::Present { checksum } => write!(f, "present ({checksum})"),
        }
    }
}

/// Checks whether a failed read means the resource does not exist.
fn is_not_found(output: &CommandOutput) -> bool {
    let description = ModelNode::parse(&output.stdout)
        .ok()
        .filter(|node| node.outcome() == Some("failed"))
        .and_then(|node| node.get("failure-description").and_then(ModelNode::as_str).map(str::to_string));

    let haystacks: [&str; 3] = [
        description.as_deref().unwrap_or(""),
        output.stdout.as_str(),
        output.stderr.as_str(),
    ];
    haystacks
        .iter()
        .any(|text| NOT_FOUND_MARKERS.iter().any(|marker| text.contains(marker)))
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
