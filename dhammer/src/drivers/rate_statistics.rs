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

//! Per-tick rate statistics.

use crate::error::{HammerError, Result};
use crate::fan_in::FanInSender;
use crate::lifecycle::LoopLatch;
use crate::subsystem::{StatId, Statistics, StatisticsParams, Subsystem};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// One named counter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stat {
    #[serde(rename = "stat_name")]
    pub name: &'static str,
    #[serde(rename = "stat_value")]
    pub value: u64,
    #[serde(rename = "stat_previous_ticker_value")]
    pub previous_tick_value: u64,
    #[serde(rename = "stat_rate_per_second")]
    pub rate_per_second: f64,
}

impl Stat {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            value: 0,
            previous_tick_value: 0,
            rate_per_second: 0.0,
        }
    }
}

/// Buffers observations, folds them into counters and computes a rate every tick.
pub struct RateStatistics {
    tick: Duration,
    emit_lines: bool,
    stat_lines: FanInSender<String>,
    errors: FanInSender<HammerError>,
    observations: mpsc::Sender<StatId>,
    inbox: tokio::sync::Mutex<mpsc::Receiver<StatId>>,
    table: Mutex<BTreeMap<&'static str, Stat>>,
    latch: LoopLatch,
}

impl RateStatistics {
    pub fn new(params: StatisticsParams) -> Self {
        let config = &params.config.statistics;
        let (observations, inbox) = mpsc::channel(config.buffer_size.max(1));
        Self {
            tick: config.tick_interval(),
            emit_lines: config.emit_lines,
            stat_lines: params.stat_lines,
            errors: params.errors,
            observations,
            inbox: tokio::sync::Mutex::new(inbox),
            table: Mutex::new(BTreeMap::new()),
            latch: LoopLatch::new(),
        }
    }

    /// Counters sorted by name.
    pub fn snapshot(&self) -> Vec<Stat> {
        self.table().values().cloned().collect()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, BTreeMap<&'static str, Stat>> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn fold(&self, id: StatId) {
        self.table()
            .entry(id.name())
            .or_insert_with(|| Stat::new(id.name()))
            .value += 1;
    }

    fn on_tick(&self) {
        let seconds = self.tick.as_secs_f64();
        let line = {
            let mut table = self.table();
            for stat in table.values_mut() {
                stat.rate_per_second = (stat.value - stat.previous_tick_value) as f64 / seconds;
                stat.previous_tick_value = stat.value;
            }
            if !self.emit_lines || table.is_empty() {
                return;
            }
            table
                .values()
                .map(|stat| format!("{}={} ({:.2}/s)", stat.name, stat.value, stat.rate_per_second))
                .collect::<Vec<_>>()
                .join(" ")
        };
        self.stat_lines.try_send(line);
    }
}

#[async_trait]
impl Subsystem for RateStatistics {
    async fn init(&self) -> Result<()> {
        if self.tick.is_zero() {
            return Err(HammerError::Config(
                "statistics tick interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    async fn run(&self) {
        let Some(mut guard) = self.latch.enter() else {
            return;
        };
        let mut inbox = self.inbox.lock().await;
        let mut ticker = time::interval_at(Instant::now() + self.tick, self.tick);

        loop {
            tokio::select! {
                _ = guard.stopped() => break,
                observed = inbox.recv() => match observed {
                    Some(id) => self.fold(id),
                    None => break,
                },
                _ = ticker.tick() => self.on_tick(),
            }
        }
    }

    /// Waits for the run loop, then folds whatever is still buffered.
    async fn stop(&self) -> Result<()> {
        self.latch.stop().await;
        let mut inbox = self.inbox.lock().await;
        while let Ok(id) = inbox.try_recv() {
            self.fold(id);
        }
        Ok(())
    }

    /// Publishes the final counters as one JSON line on the stat channel.
    async fn deinit(&self) -> Result<()> {
        match serde_json::to_string(&self.snapshot()) {
            Ok(stats) => {
                self.stat_lines.try_send(stats);
            }
            Err(err) => {
                self.errors.try_send(err.into());
            }
        }
        Ok(())
    }
}

impl Statistics for RateStatistics {
    fn add_stat(&self, id: StatId) -> bool {
        self.observations.try_send(id).is_ok()
    }

    fn render(&self) -> String {
        let mut rendered = String::new();
        for stat in self.table().values() {
            let _ = writeln!(
                rendered,
                "{}: value={} previous={} rate={:.2}/s",
                stat.name, stat.value, stat.previous_tick_value, stat.rate_per_second
            );
        }
        rendered
    }
}
