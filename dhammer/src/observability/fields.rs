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

//! Canonical field values and value-format helpers.

use crate::subsystem::Role;
use std::net::SocketAddr;

pub const NONE: &str = "none";

// Task labels for the eight background tasks.
pub const TASK_ERROR_READER: &str = "error_reader";
pub const TASK_STAT_READER: &str = "stat_reader";
pub const TASK_LOG_READER: &str = "log_reader";
pub const TASK_STATISTICS: &str = "statistics";
pub const TASK_WRITER: &str = "writer";
pub const TASK_LISTENER: &str = "listener";
pub const TASK_HANDLER: &str = "handler";
pub const TASK_GENERATOR: &str = "generator";

pub fn format_role(role: Role) -> String {
    role.to_string().to_ascii_lowercase()
}

pub fn format_peer(peer: Option<SocketAddr>) -> String {
    peer.map(|peer| peer.to_string())
        .unwrap_or_else(|| NONE.to_string())
}
