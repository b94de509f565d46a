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

//! Bounded fan-in channels for log, stat and error traffic.
//!
//! Many producers, one consumer. Sends never block: a full channel drops the message
//! and reports `false`. The channel is closed explicitly by the orchestrator once every
//! producer is stopped; sends after that are dropped the same way.

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Fan-in capacity used when the configuration does not say otherwise.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Creates a fan-in channel holding at most `capacity` undelivered messages.
pub fn channel<T>(name: &'static str, capacity: usize) -> (FanInSender<T>, FanInReceiver<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        FanInSender {
            name,
            slot: Arc::new(RwLock::new(Some(tx))),
        },
        FanInReceiver { name, rx },
    )
}

/// Producer side. Every clone shares the same underlying sender, so a single
/// [`FanInSender::close`] closes the channel for all of them.
pub struct FanInSender<T> {
    name: &'static str,
    slot: Arc<RwLock<Option<mpsc::Sender<T>>>>,
}

impl<T> Clone for FanInSender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            slot: self.slot.clone(),
        }
    }
}

impl<T> Debug for FanInSender<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanInSender")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> FanInSender<T> {
    /// Best-effort send; `false` if the channel is full or closed.
    pub fn try_send(&self, message: T) -> bool {
        let slot = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_ref() {
            Some(tx) => match tx.try_send(message) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
            },
            None => false,
        }
    }

    /// Closes the channel. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.take().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_none()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Consumer side; yields buffered messages until the channel is closed and drained.
pub struct FanInReceiver<T> {
    name: &'static str,
    rx: mpsc::Receiver<T>,
}

impl<T> Debug for FanInReceiver<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanInReceiver")
            .field("name", &self.name)
            .finish()
    }
}

impl<T> FanInReceiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Hands every message to `sink` until the channel is closed and empty.
    pub async fn for_each<F>(mut self, mut sink: F)
    where
        F: FnMut(T),
    {
        while let Some(message) = self.rx.recv().await {
            sink(message);
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
