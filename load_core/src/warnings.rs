//! # Warnings and Dispatch
//!
//! [`LoadWarning`] records are append-only: once emitted through the
//! [`WarningDispatcher`] they are only ever read back.
//!
//! ## Observer cost
//!
//! Observers run synchronously on the caller's thread, in subscription
//! order, inside whichever phase emitted the warning. A slow observer slows
//! propagation and checking by exactly its own run time; observers that do
//! heavy work should hand the warning off to their own queue and return.
//!
//! An observer that returns an error or panics is logged and skipped. The
//! remaining observers still run and the emitting phase never sees the
//! failure.

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Warning severity, ordered by urgency (`Critical` first).
///
/// The derived ordering makes `Critical < High < ... < Info`, so the most
/// urgent of a set of severities is its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// All severities, most urgent first
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }

    /// Whether `self` is at least as urgent as `other`
    pub fn is_at_least(&self, other: Severity) -> bool {
        *self <= other
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning category raised when the dependency graph contains a cycle
pub const CYCLIC_DEPENDENCY: &str = "CYCLIC_DEPENDENCY";

/// One notification about a load or group of loads.
///
/// # Example
/// ```
/// use load_core::warnings::{LoadWarning, Severity};
///
/// let warning = LoadWarning::new(Severity::High, "POWER", "Panel overloaded")
///     .with_system("PANEL-1")
///     .with_threshold(250.0)
///     .with_action("Split the panel");
///
/// assert!(warning.id.is_empty()); // assigned on emit
/// assert_eq!(warning.threshold_exceeded, Some(250.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadWarning {
    /// Assigned by the dispatcher when empty
    #[serde(default)]
    pub id: String,

    pub severity: Severity,

    /// Load category code or a check name such as `CYCLIC_DEPENDENCY`
    pub category: String,

    pub message: String,

    #[serde(default)]
    pub affected_systems: BTreeSet<String>,

    /// The limit that was exceeded, for threshold warnings
    #[serde(default)]
    pub threshold_exceeded: Option<f64>,

    #[serde(default)]
    pub recommended_action: String,

    #[serde(default)]
    pub auto_fixable: bool,

    /// Load this warning is attached to, if any
    #[serde(default)]
    pub load_id: Option<String>,
}

impl LoadWarning {
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        LoadWarning {
            id: String::new(),
            severity,
            category: category.into(),
            message: message.into(),
            affected_systems: BTreeSet::new(),
            threshold_exceeded: None,
            recommended_action: String::new(),
            auto_fixable: false,
            load_id: None,
        }
    }

    /// Add an affected system (builder pattern). Empty names are ignored.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        if !system.is_empty() {
            self.affected_systems.insert(system);
        }
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold_exceeded = Some(threshold);
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    pub fn auto_fixable(mut self, auto_fixable: bool) -> Self {
        self.auto_fixable = auto_fixable;
        self
    }

    /// Attach the warning to a load (builder pattern)
    pub fn for_load(mut self, load_id: impl Into<String>) -> Self {
        self.load_id = Some(load_id.into());
        self
    }
}

/// Failure reported by a warning observer
#[derive(Error, Debug, Clone, PartialEq)]
#[error("warning observer failed: {0}")]
pub struct ObserverError(pub String);

impl From<&str> for ObserverError {
    fn from(message: &str) -> Self {
        ObserverError(message.to_string())
    }
}

impl From<String> for ObserverError {
    fn from(message: String) -> Self {
        ObserverError(message)
    }
}

/// Observer callback invoked for every emitted warning
pub type WarningCallback = Box<dyn FnMut(&LoadWarning) -> Result<(), ObserverError> + Send>;

/// Handle returned by [`WarningDispatcher::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Observer {
    id: SubscriptionId,
    callback: WarningCallback,
}

/// Ordered warning log plus synchronous observer notification.
#[derive(Default)]
pub struct WarningDispatcher {
    log: Vec<LoadWarning>,
    observers: Vec<Observer>,
    next_warning: u64,
    next_subscription: u64,
}

impl std::fmt::Debug for WarningDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarningDispatcher")
            .field("log", &self.log)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl WarningDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Observers are notified in subscription order.
    pub fn subscribe(&mut self, callback: WarningCallback) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push(Observer { id, callback });
        id
    }

    /// Remove an observer. Returns whether it was subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Append a warning to the log and notify every observer.
    ///
    /// Warnings without an id get the next sequential id (`W-00001`, ...).
    /// Returns the id of the logged warning.
    pub fn emit(&mut self, mut warning: LoadWarning) -> String {
        self.next_warning += 1;
        if warning.id.is_empty() {
            warning.id = format!("W-{:05}", self.next_warning);
        }
        debug!(
            warning_id = %warning.id,
            severity = %warning.severity,
            category = %warning.category,
            "{}",
            warning.message
        );

        let id = warning.id.clone();
        self.log.push(warning);
        let logged = &self.log[self.log.len() - 1];

        for observer in &mut self.observers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (observer.callback)(logged)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(warning_id = %id, subscription = observer.id.0, "{e}");
                }
                Err(_) => {
                    warn!(warning_id = %id, subscription = observer.id.0, "warning observer panicked");
                }
            }
        }

        id
    }

    /// The ordered warning log
    pub fn log(&self) -> &[LoadWarning] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Warnings of exactly `severity`, in emission order
    pub fn by_severity(&self, severity: Severity) -> Vec<&LoadWarning> {
        self.log.iter().filter(|w| w.severity == severity).collect()
    }

    /// Most urgent severity in the log
    pub fn highest_severity(&self) -> Option<Severity> {
        self.log.iter().map(|w| w.severity).min()
    }

    /// Clear the log and restart id numbering. Observers stay subscribed.
    pub fn clear(&mut self) {
        self.log.clear();
        self.next_warning = 0;
    }
}
