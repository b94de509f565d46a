/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Subsystem lifecycle bookkeeping.
//!
//! Two pieces live here:
//!
//! - [`Lifecycle`], the orchestrator's per-role phase ledger. Every `init`, `stop*` and
//!   `deinit` call goes through [`Lifecycle::drive`], which refuses out-of-order
//!   transitions before they reach the subsystem.
//! - [`LoopLatch`], the barrier shared by every `run*`/`stop*` pair: `stop` does not
//!   return until the loop it targets has exited.

use crate::error::{HammerError, Result};
use crate::subsystem::Role;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::watch;

/// Where a subsystem role currently sits in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Initialized,
    /// Transport only: the listener is stopped, the writer is still running.
    Stopping,
    Stopped,
    DeInitialized,
}

/// A lifecycle call the orchestrator wants to make.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Init,
    StopListener,
    Stop,
    DeInit,
}

impl Phase {
    /// Returns the phase reached by `transition`, or `None` if it is out of order.
    pub fn advance(self, transition: Transition) -> Option<Phase> {
        match (self, transition) {
            (Phase::Constructed, Transition::Init) => Some(Phase::Initialized),
            (Phase::Initialized, Transition::StopListener) => Some(Phase::Stopping),
            (Phase::Initialized | Phase::Stopping, Transition::Stop) => Some(Phase::Stopped),
            // stopping twice is a barrier, not an error
            (Phase::Stopped, Transition::Stop) => Some(Phase::Stopped),
            (Phase::Stopped, Transition::DeInit) => Some(Phase::DeInitialized),
            _ => None,
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Constructed => "constructed",
            Phase::Initialized => "initialized",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
            Phase::DeInitialized => "deinitialized",
        };
        f.write_str(name)
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Transition::Init => "init",
            Transition::StopListener => "stop_listener",
            Transition::Stop => "stop",
            Transition::DeInit => "deinit",
        };
        f.write_str(name)
    }
}

/// Per-role phase ledger owned by the orchestrator.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    phases: Mutex<[Phase; Role::COUNT]>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            phases: Mutex::new([Phase::Constructed; Role::COUNT]),
        }
    }

    pub(crate) fn phase(&self, role: Role) -> Phase {
        self.lock()[role.index()]
    }

    /// Checks `transition` against the ledger, runs `call`, then records the new phase.
    ///
    /// A failed `Init` leaves the role `Constructed`. Any other call counts as having
    /// happened once it returns, error or not.
    pub(crate) async fn drive<F, Fut>(
        &self,
        role: Role,
        transition: Transition,
        call: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let current = self.phase(role);
        let next = current
            .advance(transition)
            .ok_or(HammerError::Lifecycle {
                role,
                transition,
                phase: current,
            })?;

        let result = call().await;

        if result.is_ok() || transition != Transition::Init {
            let mut phases = self.lock();
            // a concurrent call may have moved the role on while this one ran
            if phases[role.index()] == current {
                phases[role.index()] = next;
            }
        }
        result
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, [Phase; Role::COUNT]> {
        self.phases.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopState {
    Idle,
    Running,
    Stopping,
    Finished,
}

/// Start/stop barrier for one long-running loop.
///
/// At most one caller gets past [`LoopLatch::enter`]. [`LoopLatch::stop`] asks the loop
/// to finish and waits until its [`LoopGuard`] is dropped. Stopping a loop that never
/// started marks it finished, so a later `enter` is refused instead of hanging.
#[derive(Debug)]
pub struct LoopLatch {
    state: watch::Sender<LoopState>,
}

impl Default for LoopLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopLatch {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LoopState::Idle);
        Self { state }
    }

    /// Admits the loop, or returns `None` if it already ran or was stopped.
    pub fn enter(&self) -> Option<LoopGuard<'_>> {
        let entered = self.state.send_if_modified(|state| {
            if *state == LoopState::Idle {
                *state = LoopState::Running;
                true
            } else {
                false
            }
        });

        entered.then(|| LoopGuard {
            latch: self,
            state: self.state.subscribe(),
        })
    }

    /// Requests termination and blocks until the loop has exited.
    pub async fn stop(&self) {
        self.state.send_modify(|state| {
            *state = match *state {
                LoopState::Idle | LoopState::Finished => LoopState::Finished,
                LoopState::Running | LoopState::Stopping => LoopState::Stopping,
            }
        });

        let mut state = self.state.subscribe();
        let _ = state.wait_for(|state| *state == LoopState::Finished).await;
    }

    /// True once `stop` has been requested or the loop has finished.
    pub fn is_stopped(&self) -> bool {
        matches!(
            *self.state.borrow(),
            LoopState::Stopping | LoopState::Finished
        )
    }
}

/// Held by a running loop; dropping it releases everyone blocked in [`LoopLatch::stop`].
#[derive(Debug)]
pub struct LoopGuard<'a> {
    latch: &'a LoopLatch,
    state: watch::Receiver<LoopState>,
}

impl LoopGuard<'_> {
    /// Resolves once a stop has been requested.
    pub async fn stopped(&mut self) {
        let _ = self
            .state
            .wait_for(|state| matches!(state, LoopState::Stopping | LoopState::Finished))
            .await;
    }

    pub fn stop_requested(&self) -> bool {
        self.latch.is_stopped()
    }
}

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        self.latch.state.send_replace(LoopState::Finished);
    }
}
