//! Lifecycle vocabulary shared by hosts, units and failure reports.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A lifecycle notification the owner forwards to its units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The unit was installed; fired by `install`, never forwarded separately
    Create,
    /// Something the owner depends on (inherited context) changed
    DependenciesChanged,
    /// The owner received a new configuration
    ConfigurationUpdate,
    /// Hot reload reassembled the owner
    Reassemble,
    /// The owner was removed from its tree, possibly temporarily
    Deactivate,
    /// The owner is going away for good
    Dispose,
}

impl LifecycleEvent {
    /// Every event, in the order an owner would first see them
    pub const ALL: [LifecycleEvent; 6] = [
        LifecycleEvent::Create,
        LifecycleEvent::DependenciesChanged,
        LifecycleEvent::ConfigurationUpdate,
        LifecycleEvent::Reassemble,
        LifecycleEvent::Deactivate,
        LifecycleEvent::Dispose,
    ];

    /// Stable name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Create => "create",
            LifecycleEvent::DependenciesChanged => "dependencies_changed",
            LifecycleEvent::ConfigurationUpdate => "configuration_update",
            LifecycleEvent::Reassemble => "reassemble",
            LifecycleEvent::Deactivate => "deactivate",
            LifecycleEvent::Dispose => "dispose",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic tag naming the concrete kind of a behavior unit.
///
/// Units report their kind explicitly so failure reports can name the
/// offending unit without relying on type reflection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKind(Cow<'static, str>);

impl UnitKind {
    pub const VALUE: UnitKind = UnitKind::new("value");
    pub const OBSERVABLE: UnitKind = UnitKind::new("observable");
    pub const CALLBACK: UnitKind = UnitKind::new("callback");
    pub const FUTURE: UnitKind = UnitKind::new("future");
    pub const STREAM: UnitKind = UnitKind::new("stream");

    /// Kind with a static name
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Kind with a name built at runtime
    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for UnitKind {
    fn from(name: &'static str) -> Self {
        UnitKind::new(name)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
