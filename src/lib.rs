//! Container environments for radio-frequency tooling.
//!
//! `rfswift` launches and manages containers that bundle radio tooling on top
//! of whichever container engine the host provides. Docker and Podman speak
//! the same API but live behind different sockets, storage layouts, and
//! service managers; this crate detects them, picks one, and drives
//! interactive sessions with device, display, and audio passthrough.
//!
//! # Architecture
//!
//! The engine selector resolves a backend once per process. Every command
//! opens a short-lived client from it. Interactive sessions bridge the local
//! terminal to the container, restoring the terminal on every exit path and
//! forwarding window size changes to the remote TTY.
//!
//! # Modules
//!
//! - [`api`]: Command orchestration shared by the CLI and embedders
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`engine`]: Engine detection, capabilities, and selection
//! - [`error`]: Semantic error types for the application
//! - [`freshness`]: Local image freshness against published tags
//! - [`ops`]: One-shot container and image operations
//! - [`session`]: Interactive container sessions

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod freshness;
pub mod ops;
pub mod session;
