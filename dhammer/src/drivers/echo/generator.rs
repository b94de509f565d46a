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

use crate::config::{validate_payload_size, validate_rate};
use crate::error::{HammerError, Result};
use crate::lifecycle::LoopLatch;
use crate::observability::events;
use crate::subsystem::{
    DriverParams, Generator, Packet, Reporter, StatId, StatRecorder, Subsystem, Transport,
    UpdateFields,
};
use async_trait::async_trait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::info;

const COMPONENT: &str = "echo_generator";

pub const PAYLOADS_SENT: StatId = StatId("payloads_sent");
pub const WRITE_ERRORS: StatId = StatId("write_errors");

const SEQUENCE_LEN: usize = 8;
const MIN_PERIOD: Duration = Duration::from_nanos(1);
const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Settings {
    rate: f64,
    payload_size: usize,
}

/// Paced datagram generator with live `rate` and `payload_size` updates.
pub struct EchoGenerator {
    target: SocketAddr,
    count: Option<u64>,
    settings: watch::Sender<Settings>,
    transport: Arc<dyn Transport>,
    reporter: Reporter,
    stats: StatRecorder,
    latch: LoopLatch,
}

impl EchoGenerator {
    pub fn new(params: DriverParams) -> Self {
        let generator = &params.config.generator;
        let (settings, _) = watch::channel(Settings {
            rate: generator.rate,
            payload_size: generator.payload_size,
        });
        Self {
            target: generator.target,
            count: generator.count,
            settings,
            transport: params.transport,
            reporter: params.reporter,
            stats: params.stats,
            latch: LoopLatch::new(),
        }
    }

    /// Payloads per second currently in effect.
    pub fn rate(&self) -> f64 {
        self.settings.borrow().rate
    }

    pub fn payload_size(&self) -> usize {
        self.settings.borrow().payload_size
    }

    async fn send(&self, sequence: u64, payload_size: usize) {
        let packet = Packet::new(self.target, payload(sequence, payload_size));
        match self.transport.write(packet).await {
            Ok(()) => {
                self.stats.record(PAYLOADS_SENT);
            }
            Err(err) => {
                self.stats.record(WRITE_ERRORS);
                self.reporter.error(err);
            }
        }
    }
}

/// `size` bytes starting with the big-endian sequence number, truncated if shorter.
fn payload(sequence: u64, size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    let prefix = sequence.to_be_bytes();
    let len = size.min(SEQUENCE_LEN);
    data[..len].copy_from_slice(&prefix[..len]);
    data
}

fn pacer(rate: f64) -> Interval {
    let period = Duration::try_from_secs_f64(rate.recip())
        .unwrap_or(MAX_PERIOD)
        .clamp(MIN_PERIOD, MAX_PERIOD);
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
    interval
}

fn parse_update(fields: &UpdateFields) -> Result<(Option<f64>, Option<usize>)> {
    let mut rate = None;
    let mut payload_size = None;

    for (key, value) in fields {
        match key.as_str() {
            "rate" => {
                let parsed = value
                    .as_f64()
                    .ok_or_else(|| HammerError::invalid_field(key, expected("a number", value)))?;
                validate_rate(parsed).map_err(|reason| HammerError::invalid_field(key, reason))?;
                rate = Some(parsed);
            }
            "payload_size" => {
                let parsed = value
                    .as_u64()
                    .and_then(|size| usize::try_from(size).ok())
                    .ok_or_else(|| {
                        HammerError::invalid_field(key, expected("an unsigned integer", value))
                    })?;
                validate_payload_size(parsed)
                    .map_err(|reason| HammerError::invalid_field(key, reason))?;
                payload_size = Some(parsed);
            }
            _ => return Err(HammerError::invalid_field(key, "unknown field")),
        }
    }

    Ok((rate, payload_size))
}

fn expected(what: &str, value: &Value) -> String {
    format!("expected {what}, got {value}")
}

#[async_trait]
impl Subsystem for EchoGenerator {
    async fn init(&self) -> Result<()> {
        let settings = *self.settings.borrow();
        self.reporter.log(format!(
            "echo generator targeting {} at {}/s with {}-byte payloads",
            self.target, settings.rate, settings.payload_size
        ));
        Ok(())
    }

    async fn run(&self) {
        let Some(mut guard) = self.latch.enter() else {
            return;
        };
        let mut settings = self.settings.subscribe();
        let mut ticker = pacer(settings.borrow_and_update().rate);
        let mut sequence: u64 = 0;

        loop {
            if self.count.is_some_and(|count| sequence >= count) {
                info!(
                    event = events::GENERATOR_COMPLETED,
                    component = COMPONENT,
                    sent = sequence,
                    "generator workload complete"
                );
                self.reporter
                    .log(format!("echo generator finished after {sequence} payloads"));
                break;
            }

            tokio::select! {
                biased;
                _ = guard.stopped() => break,
                changed = settings.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    ticker = pacer(settings.borrow_and_update().rate);
                }
                _ = ticker.tick() => {
                    let payload_size = settings.borrow().payload_size;
                    self.send(sequence, payload_size).await;
                    sequence += 1;
                }
            }
        }
    }

    async fn stop(&self) -> Result<()> {
        self.latch.stop().await;
        Ok(())
    }

    async fn deinit(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    /// Validates every field first; nothing is applied if any of them is rejected.
    async fn update(&self, fields: UpdateFields) -> Result<()> {
        let (rate, payload_size) = parse_update(&fields)?;
        if rate.is_none() && payload_size.is_none() {
            return Ok(());
        }

        self.settings.send_modify(|settings| {
            if let Some(rate) = rate {
                settings.rate = rate;
            }
            if let Some(payload_size) = payload_size {
                settings.payload_size = payload_size;
            }
        });

        let settings = *self.settings.borrow();
        info!(
            event = events::GENERATOR_UPDATED,
            component = COMPONENT,
            rate = settings.rate,
            payload_size = settings.payload_size,
            "generator updated"
        );
        self.reporter.log(format!(
            "echo generator updated: rate={}/s payload_size={}",
            settings.rate, settings.payload_size
        ));
        Ok(())
    }
}
