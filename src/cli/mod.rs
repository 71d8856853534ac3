//! # CLI Module
//!
//! Command-line tools for exercising the gateway pipeline without a transport.
//!
//! ## Commands
//!
//! ### `match`
//!
//! Compile a pattern and match one URI against it:
//!
//! ```bash
//! rgw match --pattern 'maas://machine/{system_id}/power/{action:on|off}' \
//!     --uri maas://machine/abc123/power/on
//! ```
//!
//! ### `filter`
//!
//! Apply a filter expression to a JSON array:
//!
//! ```bash
//! rgw filter --expr "status eq 'active' and cpu_count gt 4" --input machines.json
//! ```
//!
//! ### `dispatch`
//!
//! Run a URI through routing, validation, caching, filtering, pagination and
//! formatting, with fixture handlers standing in for the backend:
//!
//! ```bash
//! rgw dispatch --fixtures fixtures.yaml --uri 'maas://machine?limit=10&page=2' \
//!     --accept application/xml
//! ```
//!
//! Options:
//! - `--config <FILE>` - gateway config YAML (also `RGW_CONFIG`)
//! - `--payload <FILE>` / `--content-type` - request payload
//! - `--fail-on-error` - non-zero exit for 4xx and 5xx responses
//!
//! ### `routes`
//!
//! List the patterns a fixture file registers.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use resource_gateway::cli::{run, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run(&cli, &mut std::io::stdout())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run, run_cli, Cli, Commands};
