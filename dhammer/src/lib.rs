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

//! # dhammer
//!
//! `dhammer` drives network traffic generation runs. A run wires four subsystems
//! together: a transport that owns the socket, a generator that produces payloads,
//! a handler that consumes responses and a statistics aggregator. The generator,
//! handler and statistics implementations are picked by the configured hammer type
//! from explicit [`Drivers`] registries.
//!
//! ```
//! use dhammer::{Drivers, Hammer, HammerConfig};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut config = HammerConfig::new("echo");
//! config.transport.bind = "127.0.0.1:0".parse().unwrap();
//! config.generator.target = "127.0.0.1:9".parse().unwrap();
//! config.generator.rate = 1000.0;
//! config.generator.count = Some(3);
//!
//! let mut hammer = Hammer::new(config, Drivers::with_builtin().unwrap());
//! hammer.init("127.0.0.1:0").await.unwrap();
//! assert!(hammer.control_addr().is_some());
//!
//! // the generator stops itself after three payloads, which tears the run down
//! hammer.run().await.unwrap();
//! # });
//! ```
//!
//! ## Lifecycle
//!
//! Every subsystem goes through `init`, `run`, `stop` and `deinit`. The orchestrator
//! initializes statistics, transport, handler and generator in that order and refuses
//! any out-of-order call. [`Hammer::stop`] only stops the generator; the full teardown
//! starts when the generator's run loop returns.
//!
//! ## Fan-in channels
//!
//! Subsystems report through bounded log, stat and error channels. Sends never block;
//! a full channel drops the message.
//!
//! ## Observability model
//!
//! Library code emits `tracing` events and never installs a global subscriber. The
//! `dhammer` binary and the tests initialize `tracing_subscriber` themselves.

pub mod config;
pub use config::HammerConfig;

mod control_plane;
pub use control_plane::SHUTDOWN_GRACE;

pub mod drivers;

mod error;
pub use error::{HammerError, Result};

pub mod fan_in;

mod hammer;
pub use hammer::{Hammer, TransportFactory, STATS_TARGET};

mod lifecycle;
pub use lifecycle::{LoopGuard, LoopLatch, Phase, Transition};

#[doc(hidden)]
pub mod observability;

mod registry;
pub use registry::{Drivers, Factory, Registry};

pub mod subsystem;

pub mod transport;
