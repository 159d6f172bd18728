//! Loads, categories, and the load registry
//!
//! # Overview
//!
//! - [`LoadCategory`] - Closed set of load categories (DEAD, COOLING, POWER, ...)
//! - [`Discipline`] - Structural, thermal, electrical, plumbing
//! - [`LoadResult`] - One physical load quantity with its dependency links
//! - [`LoadRegistry`] - Keyed, order-preserving store of load records
//!
//! # Example
//!
//! ```
//! use load_core::loads::{LoadCategory, LoadRegistry, LoadResult};
//!
//! let mut registry = LoadRegistry::new();
//! registry.register(
//!     LoadResult::new("INTERNAL-R1", LoadCategory::Internal, 5.0).affecting(["COOLING-R1"]),
//! )?;
//! registry.register(LoadResult::new("COOLING-R1", LoadCategory::Cooling, 0.0))?;
//!
//! let thermal = registry.list_by(|l| l.category.discipline().native_unit() == "kW");
//! assert_eq!(thermal.len(), 2);
//! # Ok::<(), load_core::errors::EngineError>(())
//! ```

pub mod load_types;
pub mod record;
pub mod registry;

pub use load_types::{Discipline, LoadCategory};
pub use record::{LoadResult, SourceLocation};
pub use registry::LoadRegistry;
