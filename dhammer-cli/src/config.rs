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

use dhammer::{HammerConfig, HammerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    #[serde(default)]
    pub(crate) control: ControlConfig,
    pub(crate) hammer: HammerConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ControlConfig {
    pub(crate) address: String,
    pub(crate) port: u16,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ControlConfig {
    /// `address:port`, bracketing IPv6 literals.
    pub(crate) fn listen_addr(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

impl CliConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, HammerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            HammerError::Config(format!(
                "Unable to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::parse(&contents)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, HammerError> {
        json5::from_str(contents)
            .map_err(|e| HammerError::Config(format!("Unable to parse config file: {e}")))
    }
}
