//! Core library for pageflow
//!
//! This crate implements the **Functional Core** of pageflow, the client-side
//! controller behind a paged, sortable, filterable data view. It decides what
//! to fetch and what to show; it never performs I/O itself.
//!
//! # Module Organization
//!
//! - [`query`]: query state, filter comparison and reconciliation decisions
//! - [`controller`]: the stateful controller applying navigation intents
//! - [`sequence`]: request sequencing used to drop out-of-order results
//! - [`view`]: the immutable view snapshot and the shared store holding it
//! - [`range`]: the ellipsized pagination strip
//! - [`config`]: pagination settings
//!
//! The I/O side (transport, fetch coordination, rendering) lives in the
//! `pageflow` binary crate.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use pageflow_core::controller::{ControllerEvent, QueryStateController};
//! use pageflow_core::config::PaginationConfig;
//!
//! let mut controller = QueryStateController::new(PaginationConfig::default())?;
//! controller.subscribe(|event| {
//!     if let ControllerEvent::Fetch(intent) = event {
//!         // hand the intent to the fetch coordinator
//!     }
//! });
//! controller.start();
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod query;
pub mod range;
pub mod sequence;
pub mod view;

pub use error::{Error, Result};
