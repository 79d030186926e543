//! simbox — a sandboxed plugin runtime.
//!
//! Untrusted user programs written in a restricted language are
//! interpreted against a per-plugin capability object; the capability
//! calls become typed domain messages that cross a serialization-only
//! channel into an embedded context, where a pure reducer state machine
//! rebuilds the observable simulation model.
//!
//! The crate is organized the way messages flow:
//!
//! - [`lang`] — the restricted language: lexer, parser, literal values.
//! - [`capability`] — capability objects and implementation modules.
//! - [`host`] — the execution host that interprets user source.
//! - [`channel`] — the host↔embed transport and envelope wire shape.
//! - [`machine`] — state machines and the embed driver.
//! - [`registry`] — plugin identity → definition mapping.
//! - [`plugins`] — the built-in plugins.

pub mod capability;
pub mod channel;
pub mod config;
pub mod error;
pub mod host;
pub mod lang;
pub mod machine;
pub mod plugins;
pub mod registry;
