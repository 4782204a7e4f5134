//! # behavior-host
//!
//! Attach reusable, non-visual **behavior units** to a stateful component and
//! let them take part in its lifecycle without hand-written plumbing.
//!
//! behavior-host models a component's cross-cutting logic as **Host + Units**:
//! - **Owner**: the stateful component; it keeps a host as a field
//! - **Unit Host**: owns the installed units and forwards every lifecycle
//!   event to them, in installation order
//! - **Behavior Unit**: timers, subscriptions, derived values, async loaders,
//!   each packaged once and reused across owners
//!
//! ## 🏗️ Module Architecture
//!
//! - `event`: lifecycle events and unit kinds
//! - `failure`: failure reports and sinks
//! - `observable`: single-threaded observable values
//! - `spawner`: local task spawning for async units
//! - `unit`: the unit contract and the built-in units
//! - `host`: the unit host, its configuration and builder
//!
//! ### Feature flags
//! - `tokio-spawner` (default): `TokioLocalSpawner` for tokio `LocalSet`s
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use behavior_host::prelude::*;
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Profile {
//!     renders: Cell<u32>,
//!     user_id: RefCell<u64>,
//! }
//!
//! impl Owner<u64> for Profile {
//!     fn mark_needs_render(&self) {
//!         self.renders.set(self.renders.get() + 1);
//!     }
//!
//!     fn configuration(&self) -> u64 {
//!         *self.user_id.borrow()
//!     }
//! }
//!
//! let profile = Rc::new(Profile::default());
//! let mut host: UnitHost<u64> = UnitHost::builder().label("profile").build(&profile);
//!
//! let likes = host.install(ObservableUnit::new(0u32));
//! host.install(
//!     CallbackUnit::new().with_configuration_update(|old_user: &u64| {
//!         println!("user changed from {old_user}");
//!         Ok(())
//!     }),
//! );
//!
//! likes.borrow().observable().update(|n| *n += 1);
//! assert_eq!(profile.renders.get(), 1);
//!
//! *profile.user_id.borrow_mut() = 7;
//! host.forward_configuration_update(&0);
//! host.forward_dispose();
//! ```

// ============================================================================
// MODULES
// ============================================================================

pub mod event;
pub mod failure;
pub mod host;
pub mod observable;
pub mod spawner;
pub mod unit;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use event::{LifecycleEvent, UnitKind};
pub use failure::{FailureReport, FailureSink, MemorySink, TracingSink, init_process_sink};
pub use host::{HostBuilder, HostConfig, HostHandle, Owner, UnitCell, UnitContext, UnitHost};
pub use observable::{Observable, Subscription};
pub use spawner::UnitSpawner;
#[cfg(feature = "tokio-spawner")]
pub use spawner::TokioLocalSpawner;
pub use unit::{
    AsyncSnapshot, BehaviorUnit, CallbackUnit, ConnectionState, ForwardingUnit, FutureUnit,
    ObservableUnit, StreamUnit, TracedUnit, UnitBase, UnitFuture, UnitResult, UnitStream,
    ValueUnit, unit_future,
};

/// Commonly used external types
pub use serde_json::Value as JsonValue;

/// Convenient re-exports for common types and traits
pub mod prelude {
    pub use crate::{
        AsyncSnapshot, BehaviorUnit, CallbackUnit, ConnectionState, FailureReport, FailureSink,
        ForwardingUnit, FutureUnit, HostBuilder, HostConfig, HostHandle, LifecycleError,
        LifecycleEvent, LifecycleResult, MemorySink, Observable, ObservableUnit, Owner,
        StreamUnit, Subscription, TracedUnit, UnitBase, UnitCell, UnitContext, UnitFuture,
        UnitHost, UnitKind, UnitResult, UnitSpawner, UnitStream, ValueUnit, unit_future,
    };

    #[cfg(feature = "tokio-spawner")]
    pub use crate::TokioLocalSpawner;

    pub use serde_json::Value as JsonValue;
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Result type alias for behavior-host operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors returned by the crate itself.
///
/// Failures inside unit callbacks are not represented here: they are
/// `anyhow::Error`s delivered to a [`FailureSink`].
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Error while parsing a host configuration
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Error while reading a host configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The process failure sink was already set
    #[error("Process failure sink already initialized")]
    SinkAlreadyInitialized,

    /// A unit needed a spawner but the host has none
    #[error("Host '{0}' has no spawner; configure one with HostBuilder::spawner")]
    NoSpawner(String),

    /// The spawner refused the task
    #[error("Spawn error: {0}")]
    Spawn(String),
}
