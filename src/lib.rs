// Licensed under the Apache-2.0 license

//! CSR documentation and descriptor generator for SoC builds.
//!
//! This crate takes the control/status register metadata of an elaborated
//! SoC build and emits human-readable documentation (a Sphinx/
//! reStructuredText tree with register diagrams and field tables) plus a
//! machine-readable CMSIS-SVD style register map.
//!
//! The one non-trivial piece is decomposition: a logical register wider
//! than the CSR bus becomes an ordered run of bus-sized sub-registers,
//! each tagged with its bit provenance, with field layouts clipped at the
//! sub-register boundaries. See [`decompose`].
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use csr_docgen::{
//!     generate_docs, generate_svd, CsrField, CsrRegion, CsrRegister,
//!     DocConfig, SocDescription,
//! };
//!
//! let soc = SocDescription::new().add_region(
//!     CsrRegion::new("timer0", 0x8000_2000, 32)
//!         .add_register(
//!             CsrRegister::new("ctrl", 32)
//!                 .add_field(CsrField::new("en", 0, 1)),
//!         ),
//! );
//! let config = DocConfig::new("My SoC").with_author("Me");
//! generate_docs(&soc, Path::new("build/documentation"), &config).unwrap();
//! generate_svd(&soc, Path::new("build/soc.svd"), &config).unwrap();
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Input model for the SoC's CSR metadata
//! - [`config`]: Project metadata and generation options ([`DocConfig`])
//! - [`decompose`]: Sub-register decomposition and field splitting
//! - [`events`]: Interrupt/event-manager enrichment
//! - [`rst`]: reStructuredText formatting helpers
//! - [`docs`]: Documentation tree emitter
//! - [`svd`]: Register map descriptor emitter

pub mod config;
pub mod decompose;
pub mod docs;
pub mod events;
pub mod rst;
pub mod svd;
pub mod types;

// Re-export main public API
pub use config::DocConfig;
pub use decompose::{DocumentedField, DocumentedRegion, DocumentedRegister};
pub use docs::generate_docs;
pub use svd::{generate_svd, svd_string};
pub use types::{
    AccessMode, CsrField, CsrRegion, CsrRegister, EventManager, EventSource, FieldValue,
    ModuleDoc, ModuleKind, SocDescription, SocModule,
};
