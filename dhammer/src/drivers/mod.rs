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

//! Drivers shipped with the crate.
//!
//! Everything here is registered explicitly through [`register_builtin`]; there is no
//! registration on import.

pub mod echo;
pub mod rate_statistics;

use crate::error::Result;
use crate::registry::Drivers;
use crate::subsystem::{DriverParams, Generator, Handler, Statistics, StatisticsParams};
use echo::{EchoGenerator, EchoHandler};
use rate_statistics::RateStatistics;
use std::sync::Arc;

/// Hammer type of the UDP echo workload.
pub const ECHO: &str = "echo";

/// Registers every built-in driver under its hammer type.
pub fn register_builtin(drivers: &mut Drivers) -> Result<()> {
    drivers.statistics.register(ECHO, rate_statistics)?;
    drivers.handlers.register(ECHO, echo_handler)?;
    drivers.generators.register(ECHO, echo_generator)?;
    Ok(())
}

fn rate_statistics(params: StatisticsParams) -> Arc<dyn Statistics> {
    Arc::new(RateStatistics::new(params))
}

fn echo_handler(params: DriverParams) -> Arc<dyn Handler> {
    Arc::new(EchoHandler::new(params))
}

fn echo_generator(params: DriverParams) -> Arc<dyn Generator> {
    Arc::new(EchoGenerator::new(params))
}
