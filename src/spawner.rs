//! Local task spawning for units that do async work.
//!
//! Dispatch stays single-threaded: tasks run on the same cooperative event
//! queue as the owner, so they may hold `Rc` state and call back into the
//! host without locks.

use crate::{LifecycleError, LifecycleResult};
use futures::future::LocalBoxFuture;
#[cfg(feature = "tokio-spawner")]
use std::rc::Rc;

/// Spawns `!Send` tasks on the owner's event loop
pub trait UnitSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> LifecycleResult<()>;
}

impl UnitSpawner for futures::executor::LocalSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> LifecycleResult<()> {
        use futures::task::LocalSpawnExt;

        LocalSpawnExt::spawn_local(self, task).map_err(|e| LifecycleError::Spawn(e.to_string()))
    }
}

/// Spawns onto a tokio `LocalSet` the spawner shares with its caller.
///
/// Tasks spawned before the set is driven wait until the next `run_until`
/// or `await` on it, so a host can be built and filled outside the set.
#[cfg(feature = "tokio-spawner")]
#[derive(Clone)]
pub struct TokioLocalSpawner {
    local: Rc<tokio::task::LocalSet>,
}

#[cfg(feature = "tokio-spawner")]
impl TokioLocalSpawner {
    pub fn new(local: Rc<tokio::task::LocalSet>) -> Self {
        Self { local }
    }

    pub fn local_set(&self) -> &Rc<tokio::task::LocalSet> {
        &self.local
    }
}

#[cfg(feature = "tokio-spawner")]
impl std::fmt::Debug for TokioLocalSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioLocalSpawner").finish_non_exhaustive()
    }
}

#[cfg(feature = "tokio-spawner")]
impl UnitSpawner for TokioLocalSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) -> LifecycleResult<()> {
        // Detached: cancellation goes through the unit's token, not the JoinHandle.
        drop(self.local.spawn_local(task));
        Ok(())
    }
}
