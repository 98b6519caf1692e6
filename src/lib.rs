//! Decoding and producer support for feature-gated (conditional) sections in
//! WebAssembly modules.
//!
//! A conditional section wraps one ordinary section record behind a boolean
//! predicate over named features. A host decoding a module supplies the set
//! of features it supports ([`HostFeatures`]); sections whose predicate is
//! unsatisfied are skipped without their contents ever being inspected, and
//! repeated sections of the same kind are merged, so one binary can carry
//! several feature-specialized variants of the same entity. [`Module::parse`]
//! performs the whole resolve-and-merge pass and yields the flattened module
//! a validator or instantiator consumes.
//!
//! On the producer side, [`compile`] collapses a priority-ordered list of
//! "use this payload when the host has feature set S" declarations into
//! mutually exclusive predicates, and [`ModuleBuilder`] emits the binary
//! format, conditional sections included.
//!
//! # Example
//!
//! Gate a tag section behind an `exceptions` feature and decode the module
//! twice, with and without the feature:
//!
//! ```
//! use wasm_cond::{
//!     section_record, Feature, FeatureConjunction, HostFeatures, Module, ModuleBuilder,
//!     Predicate, SectionKind,
//! };
//!
//! let predicate = Predicate::new(vec![FeatureConjunction::new(vec![
//!     Feature::require("exceptions"),
//! ])]);
//! let tags = section_record(SectionKind::Tag, &[0x01, 0x00, 0x00]);
//!
//! let mut builder = ModuleBuilder::new();
//! builder.vector_section(SectionKind::Type, 1, &[0x60, 0x00, 0x00]);
//! builder.conditional_section(&predicate, &tags);
//! let wasm = builder.finish();
//!
//! let host: HostFeatures = ["exceptions"].into_iter().collect();
//! let module = Module::parse(&wasm, &host)?;
//! assert_eq!(module.section(SectionKind::Tag).unwrap().count(), 1);
//!
//! let module = Module::parse(&wasm, &HostFeatures::new())?;
//! assert!(module.section(SectionKind::Tag).is_none());
//! # Ok::<(), wasm_cond::Error>(())
//! ```

#![deny(missing_docs)]

pub use crate::binary_reader::{BinaryReader, FromReader};
pub use crate::compile::*;
pub use crate::encode::*;
pub use crate::error::*;
pub use crate::features::*;
pub use crate::module::*;
pub use crate::predicate::*;
pub use crate::resolve::*;
pub use crate::sections::*;

mod binary_reader;
mod compile;
mod encode;
mod error;
mod features;
mod module;
mod predicate;
mod resolve;
mod sections;
