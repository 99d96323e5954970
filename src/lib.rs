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

//! # dokploy-deploy
//!
//! Idempotent resource reconciliation and deployment for Dokploy.
//!
//! ## Overview
//!
//! One run takes a docker image from a CI pipeline to a verified Dokploy
//! deployment:
//!
//! 1. **Resolve** the project, environment, server and application by id
//!    or by name, creating missing ones when allowed
//! 2. **Configure** the application's image source and environment variables
//! 3. **Bind** the public domain, reusing or recreating an existing binding
//! 4. **Deploy**, optionally stopping old containers first
//! 5. **Verify** with a bounded health-check loop
//!
//! Stages run strictly in sequence and the first error aborts the run.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading, input parsing and validation
//! - [`dokploy`]: Dokploy API client, typed gateway and records
//! - [`reconciler`]: Resolve-or-create for each resource kind
//! - [`apply`]: Application settings, image source and environment
//! - [`domain`]: Domain lifecycle management
//! - [`deployer`]: Stage orchestration
//! - [`health`]: Health check verifier
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! api:
//!   url: https://dokploy.example.com
//! project:
//!   name: shop
//! environment:
//!   name: production
//! application:
//!   name: api
//! docker:
//!   image: ghcr.io/acme/api:1.4.0
//! domain:
//!   host: api.example.com
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod apply;
pub mod cli;
pub mod config;
pub mod deployer;
pub mod dokploy;
pub mod domain;
pub mod error;
pub mod health;
pub mod reconciler;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, DeployConfig};
pub use deployer::{DeploymentOutcome, DeploymentStatus, Deployer};
pub use dokploy::{DokployApi, DokployClient, Gateway};
pub use domain::DomainManager;
pub use error::{DeployError, Result};
pub use health::{HealthChecker, HealthVerdict};
pub use reconciler::{ResolvedResources, ResourceReconciler, ensure};
