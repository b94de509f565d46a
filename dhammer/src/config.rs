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

//! The configuration snapshot handed to every subsystem.

use crate::error::{HammerError, Result};
use crate::fan_in;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Largest UDP payload that fits in a single IPv4 datagram.
pub const MAX_PAYLOAD_SIZE: usize = 65_507;

/// Immutable run configuration. The orchestrator only reads `hammer_type`; the
/// sections are consumed by the concrete drivers.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HammerConfig {
    pub hammer_type: String,
    #[serde(default)]
    pub channels: ChannelConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub handler: HandlerConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ChannelConfig {
    /// Capacity of each of the log, stat and error fan-in channels.
    pub capacity: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct TransportConfig {
    pub bind: SocketAddr,
    pub write_queue_size: usize,
    pub read_buffer_size: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct GeneratorConfig {
    pub target: SocketAddr,
    /// Payloads per second.
    pub rate: f64,
    pub payload_size: usize,
    /// Stop after this many payloads; unbounded when absent.
    pub count: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct HandlerConfig {
    /// Echo every inbound packet back to its sender.
    pub reply: bool,
    pub reply_queue_size: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct StatisticsConfig {
    pub tick_interval_ms: u64,
    pub buffer_size: usize,
    /// Send a rendered line to the stat channel on every tick.
    pub emit_lines: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: fan_in::DEFAULT_CAPACITY,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 0)),
            write_queue_size: 1024,
            read_buffer_size: 65_535,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target: SocketAddr::from(([127, 0, 0, 1], 9000)),
            rate: 100.0,
            payload_size: 64,
            count: None,
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            reply: false,
            reply_queue_size: 1024,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            buffer_size: 10_000,
            emit_lines: true,
        }
    }
}

impl StatisticsConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl HammerConfig {
    /// A configuration with default sections for the given hammer type.
    pub fn new(hammer_type: impl Into<String>) -> Self {
        Self {
            hammer_type: hammer_type.into(),
            channels: ChannelConfig::default(),
            transport: TransportConfig::default(),
            generator: GeneratorConfig::default(),
            handler: HandlerConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }

    pub fn hammer_type(&self) -> &str {
        &self.hammer_type
    }

    pub fn validate(&self) -> Result<()> {
        if self.hammer_type.trim().is_empty() {
            return Err(HammerError::Config("hammer_type must not be empty".to_string()));
        }
        if self.channels.capacity == 0 {
            return Err(HammerError::Config("channels.capacity must be positive".to_string()));
        }
        if self.transport.write_queue_size == 0 || self.transport.read_buffer_size == 0 {
            return Err(HammerError::Config(
                "transport queue and buffer sizes must be positive".to_string(),
            ));
        }
        validate_rate(self.generator.rate)
            .map_err(|reason| HammerError::Config(format!("generator.rate {reason}")))?;
        validate_payload_size(self.generator.payload_size)
            .map_err(|reason| HammerError::Config(format!("generator.payload_size {reason}")))?;
        if self.handler.reply_queue_size == 0 {
            return Err(HammerError::Config(
                "handler.reply_queue_size must be positive".to_string(),
            ));
        }
        if self.statistics.tick_interval_ms == 0 || self.statistics.buffer_size == 0 {
            return Err(HammerError::Config(
                "statistics tick interval and buffer size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_rate(rate: f64) -> std::result::Result<(), String> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(format!("must be a positive number, got {rate}"))
    }
}

pub(crate) fn validate_payload_size(size: usize) -> std::result::Result<(), String> {
    if (1..=MAX_PAYLOAD_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(format!("must be within 1..={MAX_PAYLOAD_SIZE}, got {size}"))
    }
}
