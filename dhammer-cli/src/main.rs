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

mod config;

use crate::config::CliConfig;
use clap::Parser;
use dhammer::{Drivers, Hammer, HammerError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Pluggable network traffic generator")]
struct HammerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args = HammerArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("dhammer failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: HammerArgs) -> Result<(), HammerError> {
    let config = CliConfig::load(&args.config)?;

    let mut hammer = Hammer::new(config.hammer, Drivers::with_builtin()?);
    hammer.init(&config.control.listen_addr()).await?;
    info!(
        run_id = %hammer.run_id(),
        hammer_type = hammer.config().hammer_type(),
        control_addr = ?hammer.control_addr(),
        "Started dhammer"
    );

    let hammer = Arc::new(hammer);
    let stopper = hammer.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Interrupt received, stopping generator");
        if let Err(err) = stopper.stop().await {
            error!("Generator failed to stop: {err}");
            std::process::exit(1);
        }
    });

    hammer.run().await
}
