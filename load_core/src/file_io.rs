//! # File I/O Module
//!
//! Reading building and config inputs and writing schedules:
//! - **Atomic saves**: write to `.tmp`, sync, rename over the target
//! - **Version validation**: configs and schedules must match the schema
//!
//! All files are JSON.
//!
//! ## Example
//!
//! ```rust,no_run
//! use load_core::file_io::{load_building, load_config, save_schedule};
//! use load_core::engine::LoadEngine;
//! use std::path::Path;
//!
//! let building = load_building(Path::new("tower.json"))?;
//! let config = load_config(Path::new("engine.json"))?;
//!
//! let mut engine = LoadEngine::new(config)?;
//! let schedule = engine.run(&building)?;
//! save_schedule(&schedule, Path::new("tower.schedule.json"))?;
//! # Ok::<(), load_core::errors::EngineError>(())
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::building::BuildingSpecification;
use crate::config::{EngineConfig, SCHEMA_VERSION};
use crate::errors::{EngineError, EngineResult};
use crate::schedule::LoadSchedule;

fn read_json<T: DeserializeOwned>(path: &Path) -> EngineResult<T> {
    let contents = fs::read_to_string(path)
        .map_err(|e| EngineError::file_error("read", path.display().to_string(), e.to_string()))?;

    serde_json::from_str(&contents).map_err(|e| EngineError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

/// Load a building description.
///
/// The building is parsed only; [`BuildingSpecification::validate`] runs at
/// the start of every orchestration run.
pub fn load_building(path: &Path) -> EngineResult<BuildingSpecification> {
    read_json(path)
}

/// Load an engine config and check its schema version and values.
///
/// # Returns
///
/// * `Ok(EngineConfig)` - Parsed and validated config
/// * `Err(EngineError::VersionMismatch)` - File version is incompatible
/// * `Err(EngineError::InvalidInput)` - A numeric setting is out of range
/// * `Err(EngineError::SerializationError)` - Invalid JSON
/// * `Err(EngineError::FileError)` - I/O error
pub fn load_config(path: &Path) -> EngineResult<EngineConfig> {
    let config: EngineConfig = read_json(path)?;
    validate_version(&config.version)?;
    config.validate()?;
    Ok(config)
}

/// Load a previously saved schedule.
pub fn load_schedule(path: &Path) -> EngineResult<LoadSchedule> {
    let schedule: LoadSchedule = read_json(path)?;
    validate_version(&schedule.version)?;
    Ok(schedule)
}

/// Save a schedule with atomic write semantics.
///
/// The save process:
/// 1. Serialize the schedule to JSON
/// 2. Write to a temporary file (`.tmp`)
/// 3. Sync to disk (fsync)
/// 4. Rename over the target (atomic on most filesystems)
///
/// Any failure after the temp file exists removes it again.
pub fn save_schedule(schedule: &LoadSchedule, path: &Path) -> EngineResult<()> {
    let json = serde_json::to_string_pretty(schedule)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut tmp_file = File::create(tmp_path).map_err(|e| {
        EngineError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    let written = write_and_sync(&mut tmp_file, json.as_bytes(), tmp_path)
        .and_then(|()| {
            fs::rename(tmp_path, path).map_err(|e| {
                EngineError::file_error("rename to final", path.display().to_string(), e.to_string())
            })
        });
    if written.is_err() {
        drop(tmp_file);
        let _ = fs::remove_file(tmp_path);
    }
    written
}

fn write_and_sync(file: &mut File, bytes: &[u8], tmp_path: &Path) -> EngineResult<()> {
    file.write_all(bytes).map_err(|e| {
        EngineError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;
    file.sync_all().map_err(|e| {
        EngineError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> EngineResult<()> {
    let mismatch = || EngineError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    let (Some(file_major), Some(current_major)) = (file_parts.first(), current_parts.first()) else {
        return Err(mismatch());
    };
    if file_major != current_major {
        return Err(mismatch());
    }

    // 0.x: a newer minor may carry breaking changes
    if *current_major == 0 {
        if let (Some(file_minor), Some(current_minor)) = (file_parts.get(1), current_parts.get(1)) {
            if file_minor > current_minor {
                return Err(mismatch());
            }
        }
    }

    Ok(())
}
