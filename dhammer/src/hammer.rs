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

//! The orchestrator.
//!
//! [`Hammer`] owns one instance of each subsystem role plus the log, stat and error
//! fan-in channels. It has two ways of stopping:
//!
//! - [`Hammer::stop`] is the soft stop. It only stops the generator and waits for it.
//! - The cascade runs exactly once, when the generator's run loop returns for any
//!   reason. It stops the control plane, the transport listener, the handler, the
//!   transport writer and statistics in that order, de-initializes all four roles and
//!   finally closes the fan-in channels. A failing step is reported and the cascade
//!   carries on.

use crate::config::HammerConfig;
use crate::control_plane::{ControlServer, ControlState};
use crate::error::{HammerError, Result};
use crate::fan_in::{self, FanInReceiver, FanInSender};
use crate::lifecycle::{Lifecycle, Phase, Transition};
use crate::observability::{events, fields};
use crate::registry::Drivers;
use crate::subsystem::{
    DriverParams, Generator, Handler, Packet, Reporter, Role, StatRecorder, Statistics,
    StatisticsParams, Transport, TransportParams,
};
use crate::transport::UdpTransport;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "hammer";

/// Target used for lines read off the stat channel.
pub const STATS_TARGET: &str = "dhammer::stats";

/// Builds the transport for a run. Defaults to [`UdpTransport`].
pub type TransportFactory = Box<dyn Fn(TransportParams) -> Arc<dyn Transport> + Send + Sync>;

pub struct Hammer {
    run_id: Uuid,
    config: Arc<HammerConfig>,
    drivers: Drivers,
    transport_factory: TransportFactory,
    pipeline: Option<Arc<Pipeline>>,
}

struct Readers {
    log: FanInReceiver<String>,
    stats: FanInReceiver<String>,
    errors: FanInReceiver<HammerError>,
}

/// Everything `init` built. Shared between `run`, `stop` and the cascade.
struct Pipeline {
    run_id: Uuid,
    lifecycle: Lifecycle,
    statistics: Arc<dyn Statistics>,
    transport: Arc<dyn Transport>,
    handler: Arc<dyn Handler>,
    generator: Arc<dyn Generator>,
    control: ControlServer,
    log: FanInSender<String>,
    stats: FanInSender<String>,
    errors: FanInSender<HammerError>,
    readers: Mutex<Option<Readers>>,
    torn_down: AtomicBool,
}

impl Hammer {
    pub fn new(config: HammerConfig, drivers: Drivers) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config: Arc::new(config),
            drivers,
            transport_factory: Box::new(|params: TransportParams| -> Arc<dyn Transport> {
                Arc::new(UdpTransport::new(params))
            }),
            pipeline: None,
        }
    }

    /// Replaces the transport built during `init`.
    pub fn with_transport<F>(mut self, factory: F) -> Self
    where
        F: Fn(TransportParams) -> Arc<dyn Transport> + Send + Sync + 'static,
    {
        self.transport_factory = Box::new(factory);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &HammerConfig {
        &self.config
    }

    /// Address the control plane is listening on, once initialized.
    pub fn control_addr(&self) -> Option<SocketAddr> {
        self.pipeline
            .as_ref()
            .map(|pipeline| pipeline.control.local_addr())
    }

    /// Current lifecycle phase of `role`, once initialized.
    pub fn phase(&self, role: Role) -> Option<Phase> {
        self.pipeline
            .as_ref()
            .map(|pipeline| pipeline.lifecycle.phase(role))
    }

    /// Builds and initializes statistics, transport, handler and generator in that
    /// order, wires the transport to the handler and binds the control plane.
    ///
    /// Any failure aborts startup. Nothing is run.
    pub async fn init(&mut self, control_addr: &str) -> Result<()> {
        if self.pipeline.is_some() {
            return Err(HammerError::AlreadyInitialized);
        }

        info!(
            event = events::HAMMER_INIT_START,
            component = COMPONENT,
            run_id = %self.run_id,
            hammer_type = self.config.hammer_type(),
            control_addr,
            "initializing hammer"
        );

        match self.build(control_addr).await {
            Ok(pipeline) => {
                info!(
                    event = events::HAMMER_INIT_OK,
                    component = COMPONENT,
                    run_id = %self.run_id,
                    control_addr = %pipeline.control.local_addr(),
                    "hammer initialized"
                );
                self.pipeline = Some(Arc::new(pipeline));
                Ok(())
            }
            Err(err) => {
                error!(
                    event = events::HAMMER_INIT_FAILED,
                    component = COMPONENT,
                    run_id = %self.run_id,
                    err = %err,
                    "hammer initialization failed"
                );
                Err(err)
            }
        }
    }

    async fn build(&self, control_addr: &str) -> Result<Pipeline> {
        self.config.validate()?;

        let capacity = self.config.channels.capacity;
        let (log, log_rx) = fan_in::channel("log", capacity);
        let (stats, stats_rx) = fan_in::channel("stat", capacity);
        let (errors, errors_rx) = fan_in::channel("error", capacity);
        let reporter = Reporter::new(log.clone(), errors.clone());
        let lifecycle = Lifecycle::new();
        let hammer_type = self.config.hammer_type();

        let statistics = self.drivers.statistics.lookup(
            hammer_type,
            StatisticsParams {
                config: self.config.clone(),
                stat_lines: stats.clone(),
                errors: errors.clone(),
            },
        )?;
        lifecycle
            .drive(Role::Statistics, Transition::Init, || statistics.init())
            .await?;
        log_initialized(Role::Statistics);

        let transport = (self.transport_factory)(TransportParams {
            config: self.config.clone(),
            reporter: reporter.clone(),
        });
        lifecycle
            .drive(Role::Transport, Transition::Init, || transport.init())
            .await?;
        log_initialized(Role::Transport);

        let params = DriverParams {
            config: self.config.clone(),
            transport: transport.clone(),
            reporter,
            stats: StatRecorder::for_statistics(statistics.clone()),
        };

        let handler = self.drivers.handlers.lookup(hammer_type, params.clone())?;
        lifecycle
            .drive(Role::Handler, Transition::Init, || handler.init())
            .await?;
        log_initialized(Role::Handler);

        // weak: the handler owns the transport, a strong ref here would cycle
        let receiving = Arc::downgrade(&handler);
        transport.set_receiver(Arc::new(move |packet: Packet| {
            if let Some(handler) = receiving.upgrade() {
                handler.receive_message(packet);
            }
        }));

        let generator = self.drivers.generators.lookup(hammer_type, params)?;
        lifecycle
            .drive(Role::Generator, Transition::Init, || generator.init())
            .await?;
        log_initialized(Role::Generator);

        let control = ControlServer::bind(
            control_addr,
            ControlState {
                statistics: statistics.clone(),
                generator: generator.clone(),
                errors: errors.clone(),
            },
        )
        .await?;

        Ok(Pipeline {
            run_id: self.run_id,
            lifecycle,
            statistics,
            transport,
            handler,
            generator,
            control,
            log,
            stats,
            errors,
            readers: Mutex::new(Some(Readers {
                log: log_rx,
                stats: stats_rx,
                errors: errors_rx,
            })),
            torn_down: AtomicBool::new(false),
        })
    }

    /// Starts the eight background tasks, serves the control plane in the foreground
    /// and returns once the cascade has finished and every task has exited.
    pub async fn run(&self) -> Result<()> {
        let pipeline = self.pipeline()?;
        let readers = pipeline.take_readers().ok_or(HammerError::AlreadyRunning)?;

        let mut tasks = JoinSet::new();
        let run_id = pipeline.run_id;

        spawn_task(
            &mut tasks,
            fields::TASK_ERROR_READER,
            readers.errors.for_each(move |err| {
                error!(
                    event = events::REPORTED_ERROR,
                    component = COMPONENT,
                    run_id = %run_id,
                    "{err}"
                );
            }),
        );
        spawn_task(
            &mut tasks,
            fields::TASK_STAT_READER,
            readers.stats.for_each(|line| {
                info!(target: STATS_TARGET, event = events::REPORTED_STAT, "{line}");
            }),
        );
        spawn_task(
            &mut tasks,
            fields::TASK_LOG_READER,
            readers.log.for_each(move |message| {
                info!(
                    event = events::REPORTED_LOG,
                    component = COMPONENT,
                    run_id = %run_id,
                    "{message}"
                );
            }),
        );

        let statistics = pipeline.statistics.clone();
        spawn_task(&mut tasks, fields::TASK_STATISTICS, async move {
            statistics.run().await
        });
        let transport = pipeline.transport.clone();
        spawn_task(&mut tasks, fields::TASK_WRITER, async move {
            transport.run_writer().await
        });
        let transport = pipeline.transport.clone();
        spawn_task(&mut tasks, fields::TASK_LISTENER, async move {
            transport.run_listener().await
        });
        let handler = pipeline.handler.clone();
        spawn_task(&mut tasks, fields::TASK_HANDLER, async move {
            handler.run().await
        });

        let cascade = pipeline.clone();
        spawn_task(&mut tasks, fields::TASK_GENERATOR, async move {
            let generator = cascade.generator.clone();
            // a panicking generator still has to trigger the cascade
            if let Err(err) = tokio::spawn(async move { generator.run().await }).await {
                error!(
                    event = events::TASK_PANICKED,
                    component = COMPONENT,
                    task = fields::TASK_GENERATOR,
                    err = %err,
                    "generator run loop panicked"
                );
            }
            cascade.teardown().await;
        });

        let served = pipeline.control.serve().await;

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                error!(
                    event = events::TASK_PANICKED,
                    component = COMPONENT,
                    err = %err,
                    "background task panicked"
                );
            }
        }

        served
    }

    /// Soft stop: stops the generator and waits for it.
    ///
    /// The rest of the pipeline is torn down by the cascade once the generator's run
    /// loop returns. Stopping a generator the cascade already de-initialized succeeds
    /// without doing anything. Any other failure means the generator may still be
    /// writing, so callers should treat it as fatal.
    pub async fn stop(&self) -> Result<()> {
        let pipeline = self.pipeline()?;

        info!(
            event = events::EXTERNAL_STOP,
            component = COMPONENT,
            run_id = %pipeline.run_id,
            "stopping generator"
        );

        let stopped = pipeline
            .lifecycle
            .drive(Role::Generator, Transition::Stop, || pipeline.generator.stop())
            .await;
        match stopped {
            Err(HammerError::Lifecycle {
                phase: Phase::DeInitialized,
                ..
            }) => {
                info!(
                    event = events::EXTERNAL_STOP_LATE,
                    component = COMPONENT,
                    run_id = %pipeline.run_id,
                    "generator already finished"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    event = events::EXTERNAL_STOP_FAILED,
                    component = COMPONENT,
                    run_id = %pipeline.run_id,
                    err = %err,
                    "generator refused to stop"
                );
                Err(err)
            }
            Ok(()) => Ok(()),
        }
    }

    fn pipeline(&self) -> Result<Arc<Pipeline>> {
        self.pipeline.clone().ok_or(HammerError::NotInitialized)
    }
}

impl Pipeline {
    fn take_readers(&self) -> Option<Readers> {
        self.readers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    async fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            debug!(
                event = events::TEARDOWN_SKIPPED,
                component = COMPONENT,
                run_id = %self.run_id,
                "cascade already ran"
            );
            return;
        }

        info!(
            event = events::TEARDOWN_START,
            component = COMPONENT,
            run_id = %self.run_id,
            "generator finished, tearing down"
        );

        self.step("control_plane_stop", self.control.stop()).await;
        self.step(
            "transport_stop_listener",
            self.lifecycle
                .drive(Role::Transport, Transition::StopListener, || {
                    self.transport.stop_listener()
                }),
        )
        .await;
        self.step(
            "handler_stop",
            self.lifecycle
                .drive(Role::Handler, Transition::Stop, || self.handler.stop()),
        )
        .await;
        self.step(
            "transport_stop_writer",
            self.lifecycle
                .drive(Role::Transport, Transition::Stop, || self.transport.stop_writer()),
        )
        .await;
        self.step(
            "statistics_stop",
            self.lifecycle
                .drive(Role::Statistics, Transition::Stop, || self.statistics.stop()),
        )
        .await;
        self.step(
            "generator_stop",
            self.lifecycle
                .drive(Role::Generator, Transition::Stop, || self.generator.stop()),
        )
        .await;

        self.step(
            "transport_deinit",
            self.lifecycle
                .drive(Role::Transport, Transition::DeInit, || self.transport.deinit()),
        )
        .await;
        self.step(
            "handler_deinit",
            self.lifecycle
                .drive(Role::Handler, Transition::DeInit, || self.handler.deinit()),
        )
        .await;
        self.step(
            "generator_deinit",
            self.lifecycle
                .drive(Role::Generator, Transition::DeInit, || self.generator.deinit()),
        )
        .await;
        self.step(
            "statistics_deinit",
            self.lifecycle
                .drive(Role::Statistics, Transition::DeInit, || self.statistics.deinit()),
        )
        .await;

        close(&self.log);
        close(&self.stats);
        close(&self.errors);

        info!(
            event = events::TEARDOWN_OK,
            component = COMPONENT,
            run_id = %self.run_id,
            "teardown complete"
        );
    }

    async fn step<F>(&self, step: &'static str, outcome: F)
    where
        F: Future<Output = Result<()>>,
    {
        match outcome.await {
            Ok(()) => debug!(
                event = events::TEARDOWN_STEP_OK,
                component = COMPONENT,
                step,
                "teardown step done"
            ),
            Err(err) => {
                warn!(
                    event = events::TEARDOWN_STEP_FAILED,
                    component = COMPONENT,
                    step,
                    err = %err,
                    "teardown step failed"
                );
                self.errors.try_send(err);
            }
        }
    }
}

fn close<T>(channel: &FanInSender<T>) {
    if channel.close() {
        debug!(
            event = events::CHANNEL_CLOSED,
            component = COMPONENT,
            channel = channel.name(),
            "fan-in channel closed"
        );
    }
}

fn log_initialized(role: Role) {
    debug!(
        event = events::SUBSYSTEM_INIT_OK,
        component = COMPONENT,
        role = fields::format_role(role).as_str(),
        "subsystem initialized"
    );
}

fn spawn_task<F>(tasks: &mut JoinSet<()>, task: &'static str, work: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tasks.spawn(async move {
        debug!(event = events::TASK_START, component = COMPONENT, task, "task started");
        work.await;
        debug!(event = events::TASK_STOPPED, component = COMPONENT, task, "task stopped");
    });
}
