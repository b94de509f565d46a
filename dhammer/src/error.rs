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

//! Crate-wide error type.

use crate::lifecycle::{Phase, Transition};
use crate::subsystem::Role;
use thiserror::Error;

/// Failures surfaced by the orchestrator, the registries and the subsystems.
#[derive(Error, Debug)]
pub enum HammerError {
    #[error("{role} type already exists: {name}")]
    DuplicateType { role: Role, name: String },

    #[error("{role} - hammer type not found: {name}")]
    TypeNotFound { role: Role, name: String },

    #[error("{role}: refusing {transition} while {phase}")]
    Lifecycle {
        role: Role,
        transition: Transition,
        phase: Phase,
    },

    #[error("hammer is not initialized")]
    NotInitialized,

    #[error("hammer is already initialized")]
    AlreadyInitialized,

    #[error("hammer is already running")]
    AlreadyRunning,

    #[error("invalid update field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("transport writer is stopped")]
    WriterStopped,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("control plane: {0}")]
    ControlPlane(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HammerError {
    pub(crate) fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        HammerError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HammerError>;
