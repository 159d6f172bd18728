//! # load_core - Cross-Discipline Building Load Engine
//!
//! `load_core` computes building loads discipline by discipline (structural,
//! thermal, electrical, plumbing), links them into a dependency graph,
//! propagates effects across disciplines, and checks the result against
//! thresholds and compliance rules. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Explicit sessions**: a [`LoadEngine`] owns all run state; no globals
//! - **Deterministic**: same building, config and seed give the same schedule
//!   (apart from run id and timestamp)
//! - **Degrade, don't fail**: after input validation, problems become
//!   warnings rather than errors
//! - **JSON-First**: all public types implement Serialize/Deserialize
//!
//! ## Quick Start
//!
//! ```rust
//! use load_core::building::{BuildingSpecification, Floor, Space, SpaceType};
//! use load_core::{EngineConfig, LoadEngine};
//!
//! let building = BuildingSpecification::new("B1", "Annex")
//!     .with_floor(Floor::new(1).with_space(Space::new("R101", 120.0, 12, SpaceType::Office)));
//!
//! let mut engine = LoadEngine::new(EngineConfig::default()).unwrap();
//! let schedule = engine.run(&building).unwrap();
//!
//! let json = serde_json::to_string_pretty(&schedule).unwrap();
//! assert!(json.contains("POWER-F1"));
//! ```
//!
//! ## Modules
//!
//! - [`loads`] - Load records, categories and the registry
//! - [`graph`] - Dependency graph, ordering and impact chains
//! - [`propagation`] - Impact table and the propagation pass
//! - [`thresholds`] - Per-category magnitude limits
//! - [`compliance`] - Whole-registry compliance predicates
//! - [`warnings`] - Warning records and the dispatcher
//! - [`optimization`] - Seeded adjustment-factor search
//! - [`calculators`] - Discipline calculators
//! - [`building`] - Building input model
//! - [`engine`] - The orchestrator
//! - [`schedule`] - Run output
//! - [`config`] - Session configuration
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - JSON files with atomic saves

pub mod building;
pub mod calculators;
pub mod compliance;
pub mod config;
pub mod engine;
pub mod errors;
pub mod file_io;
pub mod graph;
pub mod loads;
pub mod optimization;
pub mod propagation;
pub mod schedule;
pub mod thresholds;
pub mod units;
pub mod warnings;

// Re-export commonly used types at crate root for convenience
pub use building::BuildingSpecification;
pub use config::{EngineConfig, SCHEMA_VERSION};
pub use engine::LoadEngine;
pub use errors::{EngineError, EngineResult};
pub use file_io::{load_building, load_config, load_schedule, save_schedule};
pub use loads::{Discipline, LoadCategory, LoadRegistry, LoadResult};
pub use schedule::LoadSchedule;
pub use warnings::{LoadWarning, Severity};
