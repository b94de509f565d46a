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

//! Pluggable driver registries.
//!
//! Generator, Handler and Statistics implementations are picked at runtime by the
//! hammer type. Each role has its own [`Registry`]; [`Drivers`] bundles the three and
//! is filled by an explicit call list (see [`crate::drivers::register_builtin`])
//! before the orchestrator is initialized.

use crate::error::{HammerError, Result};
use crate::subsystem::{DriverParams, Generator, Handler, Role, Statistics, StatisticsParams};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Builds one role instance from its construction parameters.
pub type Factory<P, T> = Box<dyn Fn(P) -> Arc<T> + Send + Sync>;

/// Name → factory mapping for a single role. Registration is append-only.
pub struct Registry<P, T: ?Sized> {
    role: Role,
    factories: HashMap<String, Factory<P, T>>,
}

impl<P, T: ?Sized> Registry<P, T> {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            factories: HashMap::new(),
        }
    }

    /// Stores `factory` under `name`; a second registration of the same name fails
    /// and leaves the first one in place.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(P) -> Arc<T> + Send + Sync + 'static,
    {
        match self.factories.entry(name.into()) {
            Entry::Occupied(existing) => Err(HammerError::DuplicateType {
                role: self.role,
                name: existing.key().clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(factory));
                Ok(())
            }
        }
    }

    /// Builds the instance registered under `name`.
    pub fn lookup(&self, name: &str, params: P) -> Result<Arc<T>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| HammerError::TypeNotFound {
                role: self.role,
                name: name.to_string(),
            })?;
        Ok(factory(params))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl<P, T: ?Sized> Debug for Registry<P, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("role", &self.role)
            .field("names", &self.names())
            .finish()
    }
}

/// The three independent registries consulted with the same hammer type.
#[derive(Debug)]
pub struct Drivers {
    pub statistics: Registry<StatisticsParams, dyn Statistics>,
    pub handlers: Registry<DriverParams, dyn Handler>,
    pub generators: Registry<DriverParams, dyn Generator>,
}

impl Default for Drivers {
    fn default() -> Self {
        Self::new()
    }
}

impl Drivers {
    /// Empty registries.
    pub fn new() -> Self {
        Self {
            statistics: Registry::new(Role::Statistics),
            handlers: Registry::new(Role::Handler),
            generators: Registry::new(Role::Generator),
        }
    }

    /// Registries populated with the drivers shipped in this crate.
    pub fn with_builtin() -> Result<Self> {
        let mut drivers = Self::new();
        crate::drivers::register_builtin(&mut drivers)?;
        Ok(drivers)
    }

    /// True when all three roles resolve `hammer_type`.
    pub fn supports(&self, hammer_type: &str) -> bool {
        self.statistics.contains(hammer_type)
            && self.handlers.contains(hammer_type)
            && self.generators.contains(hammer_type)
    }
}
