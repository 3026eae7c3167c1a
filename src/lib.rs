// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # JBoss CLI Deploy
//!
//! Idempotent deployment of application archives to JBoss AS / `WildFly`
//! through the server's administrative CLI (`jboss-cli.sh`).
//!
//! ## Overview
//!
//! For every deployment the tool:
//!
//! 1. Runs `/deployment=<name>:read-resource` and reads the content hash the
//!    server reports
//! 2. Compares it with the SHA-1 of the local archive
//! 3. Runs `deploy --name=<name> <src> --force` only if they differ
//!
//! and reports whether anything changed. Running it twice in a row changes
//! nothing the second time.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading, validation, and archive hashing
//! - [`jboss`]: CLI invocation and response parsing
//! - [`deployer`]: The check-and-deploy logic
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! server:
//!   cli_path: /opt/jboss-as/bin/jboss-cli.sh
//!   host: 192.168.0.5
//!   user: admin
//!   password: seceret
//!
//! deployments:
//!   - name: hello.war
//!     src: /tmp/hello-1.0-SNAPSHOT.war
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod deployer;
pub mod error;
pub mod jboss;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ArtifactHasher, ConfigParser, ConfigValidator, DeployConfig, DeploymentTarget};
pub use deployer::{ApplyReport, DeployOutcome, Deployer, DeploymentCheck};
pub use error::{DeployError, Result};
pub use jboss::{CommandOutput, CommandRunner, JbossCli, ProcessRunner, RemoteDeploymentState};
