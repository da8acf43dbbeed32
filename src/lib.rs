//! Behaviour-driven acceptance harness for a cloud file-storage API.
//!
//! `boxharness` runs human-readable scenarios against a live storage service.
//! Each scenario gets a fresh remote container folder and a fresh local
//! workspace, runs its steps in order while threading the most recent API
//! response between them, and releases both resources afterwards whatever the
//! outcome.
//!
//! # Modules
//!
//! - [`client`]: Storage API client with folder and file services
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`error`]: Semantic error types for the library
//! - [`fixture`]: Per-scenario fixture lifecycle and the scenario finaliser
//! - [`runner`]: Gherkin feature-file runner
//! - [`steps`]: Step registry, scenario context, and assertions
//! - [`workspace`]: Local scratch directories and recursive removal

pub mod client;
pub mod config;
pub mod error;
pub mod fixture;
pub mod runner;
pub mod steps;
pub mod workspace;
