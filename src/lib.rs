//! # Manga Reader - Reading Session Controller
//!
//! Headless core of a vertically scrolled manga chapter reader, written in
//! Rust so the same state machine can sit behind a web host, a native shell
//! or a test harness.
//!
//! ## Architecture
//!
//! The crate is organized into the following core modules:
//!
//! - **model**: page identifiers, chapter keys and route parsing
//! - **content**: chapter sources, page assembly and session storage
//! - **reader**: the reading session controller (visibility, URL sync,
//!   deep links, chrome, progress)
//! - **network**: authenticated REST adapter for chapters and progress
//! - **engine**: tokio event loop driving the controller
//! - **config**: runtime configuration
//! - **utils**: shared error types

pub mod config;
pub mod content;
pub mod engine;
pub mod model;
pub mod network;
pub mod reader;
pub mod utils;

// Re-export main types for convenience
pub use config::ReaderConfig;
pub use engine::ReaderEngine;
pub use model::{ChapterKey, Page, PageId, SourceKind};
pub use reader::{LoadState, ReaderController, ReaderEffect, ReaderPorts};
pub use utils::error::{ReaderError, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Manga Reader";

/// Default tunables
pub mod defaults {
    /// Chrome auto-hide delay in milliseconds
    pub const HIDE_DELAY_MS: u64 = 2000;
    /// Scroll distance in pixels that hides chrome immediately
    pub const SCROLL_HIDE_THRESHOLD_PX: f64 = 5.0;
    /// Layout settle delay before deep-link restoration
    pub const DEEP_LINK_SETTLE_MS: u64 = 100;
    /// Fraction of the viewport excluded at the top and bottom of the band
    pub const BAND_MARGIN: f64 = 0.4;
    /// REST backend
    pub const API_BASE_URL: &str = "http://localhost:8080/api/";
    /// Session storage prefix for external chapter context
    pub const CONTEXT_STORAGE_PREFIX: &str = "external-chapter";
}
