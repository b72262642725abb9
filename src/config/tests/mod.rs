//! Unit tests for rfswift configuration.
//!
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - Defaults, serialisation and session building
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence
//! - [`loader_tests`] - Environment parsing, CLI overrides and file loading

mod helpers;
