//! Step registry and assertion layer.
//!
//! Human-readable step phrases are mapped to handlers through an explicit,
//! ordered [`StepRegistry`]. Handlers run against a [`ScenarioContext`], which
//! owns the scenario's fixture and threads the most recent API response (the
//! [`LastResult`]) from one step to the next.
//!
//! The storage vocabulary lives in [`StepRegistry::storage`]:
//!
//! ```
//! use boxharness::steps::StepRegistry;
//!
//! # fn main() -> Result<(), boxharness::error::PhraseError> {
//! let registry = StepRegistry::storage()?;
//! assert!(registry.find("I get the contents of the trash").is_some());
//! # Ok(())
//! # }
//! ```

pub mod assertions;
mod context;
mod registry;
mod storage;


pub use context::{LOCAL_FILE_CONTENT, LastResult, ScenarioContext};
pub use registry::{
    StepArgs, StepDefinition, StepHandler, StepKeyword, StepPattern, StepRegistry,
    StepRegistryBuilder,
};
