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

//! Subsystem roles and the capability handles injected into them.
//!
//! Four roles make up a run: [`Transport`], [`Handler`], [`Generator`] and
//! [`Statistics`]. Handler, Generator and Statistics share the [`Subsystem`] lifecycle;
//! Transport has separate listener and writer loops and stops them one at a time.
//!
//! Subsystems never see the orchestrator. They get a [`Reporter`] (log and error
//! fan-in senders), a [`StatRecorder`] and, for Handler and Generator, the
//! [`Transport`] they write to.

use crate::config::HammerConfig;
use crate::error::{HammerError, Result};
use crate::fan_in::FanInSender;
use async_trait::async_trait;
use std::fmt::{Debug, Display, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

/// The four fixed subsystem roles of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Transport,
    Handler,
    Generator,
    Statistics,
}

impl Role {
    pub(crate) const COUNT: usize = 4;

    pub(crate) fn index(self) -> usize {
        match self {
            Role::Transport => 0,
            Role::Handler => 1,
            Role::Generator => 2,
            Role::Statistics => 3,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Transport => "Transport",
            Role::Handler => "Handler",
            Role::Generator => "Generator",
            Role::Statistics => "Statistics",
        };
        f.write_str(name)
    }
}

/// Identifies one named counter tracked by [`Statistics`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatId(pub &'static str);

impl StatId {
    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// One datagram on the wire. `peer` is the sender for inbound packets and the
/// destination for outbound ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    pub peer: SocketAddr,
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(peer: SocketAddr, data: Vec<u8>) -> Self {
        Self { peer, data }
    }
}

/// Callback the transport listener invokes for every inbound packet.
pub type ReceiveFn = Arc<dyn Fn(Packet) + Send + Sync>;

/// Live parameter changes for a [`Generator`], as decoded from `PUT /update`.
pub type UpdateFields = serde_json::Map<String, serde_json::Value>;

/// Log and error capabilities handed to a subsystem at construction.
///
/// Both sends are best effort: a full or closed channel drops the message and
/// returns `false`.
#[derive(Clone, Debug)]
pub struct Reporter {
    log: FanInSender<String>,
    errors: FanInSender<HammerError>,
}

impl Reporter {
    pub fn new(log: FanInSender<String>, errors: FanInSender<HammerError>) -> Self {
        Self { log, errors }
    }

    pub fn log(&self, message: impl Into<String>) -> bool {
        self.log.try_send(message.into())
    }

    pub fn error(&self, error: impl Into<HammerError>) -> bool {
        self.errors.try_send(error.into())
    }
}

/// Stat-add capability: records one observation against a counter.
#[derive(Clone)]
pub struct StatRecorder {
    record: Arc<dyn Fn(StatId) -> bool + Send + Sync>,
}

impl StatRecorder {
    pub fn new<F>(record: F) -> Self
    where
        F: Fn(StatId) -> bool + Send + Sync + 'static,
    {
        Self {
            record: Arc::new(record),
        }
    }

    /// Routes observations to `statistics` without exposing the rest of its API.
    pub fn for_statistics(statistics: Arc<dyn Statistics>) -> Self {
        Self::new(move |id| statistics.add_stat(id))
    }

    pub fn record(&self, id: StatId) -> bool {
        (self.record)(id)
    }
}

impl Debug for StatRecorder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatRecorder").finish_non_exhaustive()
    }
}

/// Owns the socket; independent listener and writer loops.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn init(&self) -> Result<()>;

    /// Binds the inbound callback. Must happen before [`Transport::run_listener`].
    fn set_receiver(&self, receiver: ReceiveFn);

    /// Reads from the socket until [`Transport::stop_listener`] is called.
    async fn run_listener(&self);

    /// Returns once the listener loop has exited.
    async fn stop_listener(&self) -> Result<()>;

    /// Drains the write queue to the socket until [`Transport::stop_writer`] is called.
    async fn run_writer(&self);

    /// Returns once the writer loop has exited.
    async fn stop_writer(&self) -> Result<()>;

    /// Queues `packet` for the writer loop.
    async fn write(&self, packet: Packet) -> Result<()>;

    async fn deinit(&self) -> Result<()>;
}

/// The shared Init → Run → Stop → DeInit lifecycle.
#[async_trait]
pub trait Subsystem: Send + Sync {
    async fn init(&self) -> Result<()>;

    /// Runs until stopped (or, for a generator, until its workload completes).
    async fn run(&self);

    /// Returns once `run` has exited.
    async fn stop(&self) -> Result<()>;

    async fn deinit(&self) -> Result<()>;
}

/// Consumes inbound packets on the transport listener's task.
pub trait Handler: Subsystem {
    /// Called synchronously by the listener; must not block.
    fn receive_message(&self, packet: Packet);
}

/// The run's driving loop; its `run` returning ends the whole run.
#[async_trait]
pub trait Generator: Subsystem {
    /// Applies a partial set of live parameter changes.
    async fn update(&self, fields: UpdateFields) -> Result<()>;
}

/// Aggregates counters into periodic rate snapshots.
pub trait Statistics: Subsystem {
    /// Non-blocking; `false` when the internal buffer is saturated.
    fn add_stat(&self, id: StatId) -> bool;

    /// Renders every counter's current value, previous-tick value and rate.
    fn render(&self) -> String;
}

/// Construction parameters for a [`Statistics`] implementation.
#[derive(Clone, Debug)]
pub struct StatisticsParams {
    pub config: Arc<HammerConfig>,
    /// Rendered stat lines go to the stat channel.
    pub stat_lines: FanInSender<String>,
    pub errors: FanInSender<HammerError>,
}

/// Construction parameters for [`Handler`] and [`Generator`] implementations.
#[derive(Clone)]
pub struct DriverParams {
    pub config: Arc<HammerConfig>,
    pub transport: Arc<dyn Transport>,
    pub reporter: Reporter,
    pub stats: StatRecorder,
}

/// Construction parameters for a [`Transport`] implementation.
#[derive(Clone, Debug)]
pub struct TransportParams {
    pub config: Arc<HammerConfig>,
    pub reporter: Reporter,
}
