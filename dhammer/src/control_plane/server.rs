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

//! Control-plane listener, request routing and bounded shutdown.

use super::http::{self, HttpRequest, HttpResponse};
use crate::error::{HammerError, Result};
use crate::fan_in::FanInSender;
use crate::lifecycle::LoopLatch;
use crate::observability::{events, fields};
use crate::subsystem::{Generator, Statistics, UpdateFields};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{info, warn};

const COMPONENT: &str = "control_plane";

/// How long a stopping server waits for in-flight requests before abandoning them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const UPDATE_OK_BODY: &str = r#"{"status":"ok"}"#;

/// What request handlers may touch.
pub(crate) struct ControlState {
    pub(crate) statistics: Arc<dyn Statistics>,
    pub(crate) generator: Arc<dyn Generator>,
    pub(crate) errors: FanInSender<HammerError>,
}

pub(crate) struct ControlServer {
    local_addr: SocketAddr,
    listener: Mutex<Option<TcpListener>>,
    state: Arc<ControlState>,
    latch: LoopLatch,
}

impl ControlServer {
    /// Binds the listener without accepting connections yet.
    pub(crate) async fn bind(addr: &str, state: ControlState) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|err| {
            HammerError::ControlPlane(format!("unable to bind control address {addr}: {err}"))
        })?;
        let local_addr = listener.local_addr()?;

        info!(
            event = events::CONTROL_BIND,
            component = COMPONENT,
            addr = %local_addr,
            "control plane bound"
        );

        Ok(Self {
            local_addr,
            listener: Mutex::new(Some(listener)),
            state: Arc::new(state),
            latch: LoopLatch::new(),
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts and answers requests until [`ControlServer::stop`] is called.
    pub(crate) async fn serve(&self) -> Result<()> {
        let Some(mut guard) = self.latch.enter() else {
            return Ok(());
        };
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| HammerError::ControlPlane("listener already served".to_string()))?;

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                _ = guard.stopped() => break,
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        connections.spawn(handle_connection(socket, peer, self.state.clone()));
                    }
                    Err(err) => {
                        warn!(
                            event = events::CONTROL_ACCEPT_FAILED,
                            component = COMPONENT,
                            err = %err,
                            "accept failed"
                        );
                        self.state.errors.try_send(err.into());
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }
        drop(listener);

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                event = events::CONTROL_ABANDONED,
                component = COMPONENT,
                abandoned = connections.len(),
                "abandoning in-flight control requests"
            );
            connections.abort_all();
        }

        info!(
            event = events::CONTROL_STOPPED,
            component = COMPONENT,
            "control plane stopped"
        );
        Ok(())
    }

    /// Stops accepting and returns once `serve` has wound down.
    pub(crate) async fn stop(&self) -> Result<()> {
        self.latch.stop().await;
        // never served: release the port here
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}

async fn handle_connection(mut socket: TcpStream, peer: SocketAddr, state: Arc<ControlState>) {
    let (method, path, response) = match http::read_request(&mut socket).await {
        Ok(request) => {
            let response = route(&state, &request).await;
            (request.method, request.path, response)
        }
        Err(err) => {
            state
                .errors
                .try_send(HammerError::ControlPlane(err.message.clone()));
            (
                fields::NONE.to_string(),
                fields::NONE.to_string(),
                HttpResponse::text(err.status, err.message),
            )
        }
    };

    if let Err(err) = http::write_response(&mut socket, &response).await {
        warn!(
            event = events::CONTROL_WRITE_FAILED,
            component = COMPONENT,
            peer = %peer,
            err = %err,
            "failed to write control response"
        );
    }

    info!(
        event = events::CONTROL_ACCESS,
        component = COMPONENT,
        peer = fields::format_peer(Some(peer)).as_str(),
        method = method.as_str(),
        path = path.as_str(),
        status = response.status,
        "control request"
    );
}

pub(crate) async fn route(state: &ControlState, request: &HttpRequest) -> HttpResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/stats") => HttpResponse::text(200, state.statistics.render()),
        ("PUT", "/update") => update(state, &request.body).await,
        _ => HttpResponse::text(404, "not found"),
    }
}

async fn update(state: &ControlState, body: &[u8]) -> HttpResponse {
    let fields: UpdateFields = match serde_json::from_slice(body) {
        Ok(fields) => fields,
        Err(err) => {
            let message = err.to_string();
            state.errors.try_send(err.into());
            return HttpResponse::text(400, message);
        }
    };

    match state.generator.update(fields).await {
        Ok(()) => HttpResponse::json(200, UPDATE_OK_BODY),
        Err(err) => {
            let message = err.to_string();
            state.errors.try_send(err);
            HttpResponse::text(500, message)
        }
    }
}
