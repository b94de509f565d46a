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

//! Fake subsystems registered under the `fake` hammer type.

#![allow(dead_code)]

use async_trait::async_trait;
use dhammer::subsystem::{
    DriverParams, Generator, Handler, Packet, ReceiveFn, Reporter, Role, StatId, StatRecorder,
    Statistics, StatisticsParams, Subsystem, Transport, TransportParams, UpdateFields,
};
use dhammer::{Drivers, Hammer, HammerConfig, HammerError, LoopLatch, Result};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub(crate) const FAKE: &str = "fake";
pub(crate) const FAKE_SENT: StatId = StatId("fake_sent");
pub(crate) const FAKE_RECEIVED: StatId = StatId("fake_received");

pub(crate) fn init_logging() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Shared state every fake reports into.
#[derive(Default)]
pub(crate) struct Fixture {
    journal: Mutex<Vec<String>>,
    pub(crate) writes: AtomicUsize,
    updates: Mutex<Vec<UpdateFields>>,
    fail_init: Mutex<Option<Role>>,
    fail_stop: Mutex<Option<Role>>,
    reporter: Mutex<Option<Reporter>>,
    stat_lines: Mutex<Option<dhammer::fan_in::FanInSender<String>>>,
    control_addr: Mutex<Option<SocketAddr>>,
}

impl Fixture {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_init(&self, role: Role) {
        *self.fail_init.lock().unwrap() = Some(role);
    }

    pub(crate) fn fail_stop(&self, role: Role) {
        *self.fail_stop.lock().unwrap() = Some(role);
    }

    /// Makes the transport journal whether `addr` still accepts connections when its
    /// listener is stopped.
    pub(crate) fn watch_control_plane(&self, addr: SocketAddr) {
        *self.control_addr.lock().unwrap() = Some(addr);
    }

    pub(crate) fn reporter(&self) -> Reporter {
        self.reporter.lock().unwrap().clone().expect("drivers built")
    }

    pub(crate) fn stat_lines(&self) -> dhammer::fan_in::FanInSender<String> {
        self.stat_lines.lock().unwrap().clone().expect("statistics built")
    }

    pub(crate) fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub(crate) fn updates(&self) -> Vec<UpdateFields> {
        self.updates.lock().unwrap().clone()
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether the log, error and stat channels still accept messages.
    pub(crate) fn channels_open(&self) -> (bool, bool, bool) {
        let reporter = self.reporter();
        let stat_lines = self.stat_lines();
        (
            reporter.log("after close"),
            reporter.error(HammerError::WriterStopped),
            stat_lines.try_send("after close".to_string()),
        )
    }

    fn record(&self, entry: impl Into<String>) {
        self.journal.lock().unwrap().push(entry.into());
    }

    fn lifecycle(&self, role: Role, call: &str) -> Result<()> {
        self.record(format!("{}.{call}", role.to_string().to_lowercase()));
        let knob = match call {
            "init" => &self.fail_init,
            "stop" => &self.fail_stop,
            _ => return Ok(()),
        };
        if *knob.lock().unwrap() == Some(role) {
            return Err(HammerError::Config(format!("injected {call} failure")));
        }
        Ok(())
    }
}

/// Registries with the fakes under [`FAKE`].
pub(crate) fn fake_drivers(fixture: &Arc<Fixture>) -> Drivers {
    let mut drivers = Drivers::new();

    let shared = fixture.clone();
    drivers
        .statistics
        .register(FAKE, move |params: StatisticsParams| -> Arc<dyn Statistics> {
            *shared.stat_lines.lock().unwrap() = Some(params.stat_lines.clone());
            Arc::new(FakeStatistics {
                fixture: shared.clone(),
                counters: Mutex::default(),
                latch: LoopLatch::new(),
            })
        })
        .expect("register statistics");

    let shared = fixture.clone();
    drivers
        .handlers
        .register(FAKE, move |params: DriverParams| -> Arc<dyn Handler> {
            Arc::new(FakeHandler {
                fixture: shared.clone(),
                stats: params.stats,
                latch: LoopLatch::new(),
            })
        })
        .expect("register handler");

    let shared = fixture.clone();
    drivers
        .generators
        .register(FAKE, move |params: DriverParams| -> Arc<dyn Generator> {
            *shared.reporter.lock().unwrap() = Some(params.reporter.clone());
            Arc::new(FakeGenerator {
                fixture: shared.clone(),
                target: params.config.generator.target,
                count: params.config.generator.count,
                transport: params.transport,
                stats: params.stats,
                latch: LoopLatch::new(),
            })
        })
        .expect("register generator");

    drivers
}

/// A hammer of type `fake` backed by [`FakeTransport`], not yet initialized.
pub(crate) fn fake_hammer(
    fixture: &Arc<Fixture>,
    configure: impl FnOnce(&mut HammerConfig),
) -> Hammer {
    let mut config = HammerConfig::new(FAKE);
    configure(&mut config);

    let shared = fixture.clone();
    Hammer::new(config, fake_drivers(fixture)).with_transport(
        move |_params: TransportParams| -> Arc<dyn Transport> {
            Arc::new(FakeTransport {
                fixture: shared.clone(),
                receiver: Mutex::new(None),
                listener: LoopLatch::new(),
                writer: LoopLatch::new(),
            })
        },
    )
}

pub(crate) struct FakeTransport {
    fixture: Arc<Fixture>,
    receiver: Mutex<Option<ReceiveFn>>,
    listener: LoopLatch,
    writer: LoopLatch,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn init(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Transport, "init")
    }

    fn set_receiver(&self, receiver: ReceiveFn) {
        self.fixture.record("transport.set_receiver");
        *self.receiver.lock().unwrap() = Some(receiver);
    }

    async fn run_listener(&self) {
        if let Some(mut guard) = self.listener.enter() {
            guard.stopped().await;
        }
    }

    async fn stop_listener(&self) -> Result<()> {
        let control_addr = *self.fixture.control_addr.lock().unwrap();
        if let Some(addr) = control_addr {
            match TcpStream::connect(addr).await {
                Ok(_) => self.fixture.record("control_plane.open"),
                Err(_) => self.fixture.record("control_plane.closed"),
            }
        }
        self.fixture.record("transport.stop_listener");
        self.listener.stop().await;
        Ok(())
    }

    async fn run_writer(&self) {
        if let Some(mut guard) = self.writer.enter() {
            guard.stopped().await;
        }
    }

    async fn stop_writer(&self) -> Result<()> {
        self.fixture.record("transport.stop_writer");
        self.writer.stop().await;
        Ok(())
    }

    /// Loops every write straight back to the receiver.
    async fn write(&self, packet: Packet) -> Result<()> {
        if self.writer.is_stopped() {
            return Err(HammerError::WriterStopped);
        }
        self.fixture.writes.fetch_add(1, Ordering::SeqCst);
        let receiver = self.receiver.lock().unwrap().clone();
        if let Some(receive) = receiver {
            if !self.listener.is_stopped() {
                receive(packet);
            }
        }
        Ok(())
    }

    async fn deinit(&self) -> Result<()> {
        self.receiver.lock().unwrap().take();
        self.fixture.lifecycle(Role::Transport, "deinit")
    }
}

pub(crate) struct FakeStatistics {
    fixture: Arc<Fixture>,
    counters: Mutex<BTreeMap<&'static str, u64>>,
    latch: LoopLatch,
}

#[async_trait]
impl Subsystem for FakeStatistics {
    async fn init(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Statistics, "init")
    }

    async fn run(&self) {
        if let Some(mut guard) = self.latch.enter() {
            guard.stopped().await;
        }
    }

    async fn stop(&self) -> Result<()> {
        let result = self.fixture.lifecycle(Role::Statistics, "stop");
        self.latch.stop().await;
        result
    }

    async fn deinit(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Statistics, "deinit")
    }
}

impl Statistics for FakeStatistics {
    fn add_stat(&self, id: StatId) -> bool {
        *self.counters.lock().unwrap().entry(id.name()).or_default() += 1;
        true
    }

    fn render(&self) -> String {
        self.counters
            .lock()
            .unwrap()
            .iter()
            .map(|(name, value)| format!("{name} {value}\n"))
            .collect()
    }
}

pub(crate) struct FakeHandler {
    fixture: Arc<Fixture>,
    stats: StatRecorder,
    latch: LoopLatch,
}

#[async_trait]
impl Subsystem for FakeHandler {
    async fn init(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Handler, "init")
    }

    async fn run(&self) {
        if let Some(mut guard) = self.latch.enter() {
            guard.stopped().await;
        }
    }

    async fn stop(&self) -> Result<()> {
        let result = self.fixture.lifecycle(Role::Handler, "stop");
        self.latch.stop().await;
        result
    }

    async fn deinit(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Handler, "deinit")
    }
}

impl Handler for FakeHandler {
    fn receive_message(&self, _packet: Packet) {
        self.stats.record(FAKE_RECEIVED);
    }
}

/// Writes one packet per millisecond until stopped or `count` packets went out.
pub(crate) struct FakeGenerator {
    fixture: Arc<Fixture>,
    target: SocketAddr,
    count: Option<u64>,
    transport: Arc<dyn Transport>,
    stats: StatRecorder,
    latch: LoopLatch,
}

#[async_trait]
impl Subsystem for FakeGenerator {
    async fn init(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Generator, "init")
    }

    async fn run(&self) {
        let Some(mut guard) = self.latch.enter() else {
            return;
        };
        let mut sent = 0u64;
        while self.count.map_or(true, |count| sent < count) {
            tokio::select! {
                biased;
                _ = guard.stopped() => break,
                _ = tokio::time::sleep(Duration::from_millis(1)) => {
                    if self.transport.write(Packet::new(self.target, vec![0; 4])).await.is_ok() {
                        self.stats.record(FAKE_SENT);
                    }
                    sent += 1;
                }
            }
        }
    }

    async fn stop(&self) -> Result<()> {
        let result = self.fixture.lifecycle(Role::Generator, "stop");
        if result.is_ok() {
            self.latch.stop().await;
        }
        result
    }

    async fn deinit(&self) -> Result<()> {
        self.fixture.lifecycle(Role::Generator, "deinit")
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn update(&self, fields: UpdateFields) -> Result<()> {
        if let Some(value) = fields.get("reject") {
            return Err(HammerError::InvalidField {
                field: "reject".to_string(),
                reason: format!("refused {value}"),
            });
        }
        self.fixture.updates.lock().unwrap().push(fields);
        Ok(())
    }
}

/// Sends one HTTP/1.1 request and returns the status code and body.
pub(crate) async fn http_request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: &str,
) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect to control plane");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let raw = String::from_utf8(raw).expect("utf-8 response");

    let status = raw
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

/// Polls `condition` until it holds or five seconds pass.
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
