//! Semantic breaking change detection for Protocol Buffers APIs.
//!
//! Two compiled descriptor sets are turned into annotation-aware
//! [`model::FileSet`]s and walked in lock-step by the [`compat`] matchers.
//! Every difference becomes a classified [`compat::Finding`].
//!
//! ```no_run
//! use proto_breaking::{ApiDefinition, DetectorConfig};
//!
//! # fn main() -> proto_breaking::Result<()> {
//! let original = ApiDefinition::from_descriptor_set_file("original.pb")?;
//! let update = ApiDefinition::from_descriptor_set_file("update.pb")?;
//! let store = original.check_breaking_changes(&update, &DetectorConfig::default())?;
//! for finding in store.breaking_findings() {
//!     println!("{}", proto_breaking::report::message(finding));
//! }
//! # Ok(())
//! # }
//! ```

pub mod compat;
pub mod config;
pub mod definition;
pub mod error;
pub mod model;
pub mod report;

pub use compat::{Compatibility, Detector, Finding, FindingCategory, FindingStore};
pub use config::{CompilerBackend, DetectorConfig, DetectorInput};
pub use definition::ApiDefinition;
pub use error::{DetectorError, Result};
