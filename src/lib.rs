#![forbid(unsafe_code)]
//! Black-box conformance harness for rdmd
//!
//! rdmd compiles a D program on demand, caches the result, and runs it. This crate drives a built rdmd binary
//! through an ordered battery of scenarios (cache hits and misses, mode flags, dependency resolution, build
//! artifacts, exit-status propagation) and an optional concurrency stress run against its shared cache.
//!
//! ## Layout
//!
//! - [`driver`] - spawn one invocation, capture merged output and a decoded status
//! - [`fixture`] - scratch files whose lifetime is tied to `Drop`
//! - [`assertions`] / [`depfile`] - expectations over invocation results
//! - [`scenario`] - the battery and its sequential runner
//! - [`stress`] - many concurrent invocations against one warm cache
//! - [`report`] - console and JSON reporters
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `scenario`
//!   modules enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod assertions;
pub mod cli;
pub mod config;
pub mod depfile;
pub mod driver;
pub mod error;
pub mod fixture;
pub mod platform;
pub mod report;
pub mod scenario;
pub mod stress;
pub mod version;

pub use assertions::AssertionFailure;
pub use config::HarnessConfig;
pub use driver::{ArgumentVector, CaseDriver, InvocationResult, ProcessDriver};
pub use error::{HarnessError, ScenarioError};
pub use version::HARNESS_VERSION;
