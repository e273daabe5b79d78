//! Configuration file provisioning engine.
//!
//! Provisions files below a root directory from layered repository entries
//! (plain files copied verbatim, `.holoscript` filters run over the previous
//! layer) on top of the pristine copies installed by the package manager.
//! Pristine copies and the last provisioned output are kept in a state
//! directory so user edits can be detected and files restored when their
//! repository entries go away.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]** and **[`platform`]**: directory layout and package-manager integration
//! - **[`files`]**: discovery, provisioning, orphan scrubbing, and diffing of managed files
//! - **[`report`]**: per-file outcome records rendered by [`logging`]
//! - **[`commands`]**: top-level subcommand orchestration (`scan`, `apply`, `diff`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod files;
pub mod logging;
pub mod platform;
pub mod report;
