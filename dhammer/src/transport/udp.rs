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

use crate::config::HammerConfig;
use crate::error::{HammerError, Result};
use crate::lifecycle::LoopLatch;
use crate::observability::events;
use crate::subsystem::{Packet, ReceiveFn, Reporter, Transport, TransportParams};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info};

const COMPONENT: &str = "udp_transport";

/// Datagram transport with independent listener and writer loops.
///
/// Outbound packets go through a bounded queue drained by [`Transport::run_writer`].
/// Stopping the writer closes the queue and flushes whatever was already in it.
pub struct UdpTransport {
    config: Arc<HammerConfig>,
    reporter: Reporter,
    socket: RwLock<Option<Arc<UdpSocket>>>,
    receiver: RwLock<Option<ReceiveFn>>,
    queue: Mutex<Option<mpsc::Sender<Packet>>>,
    pending: tokio::sync::Mutex<Option<mpsc::Receiver<Packet>>>,
    listener: LoopLatch,
    writer: LoopLatch,
}

impl UdpTransport {
    pub fn new(params: TransportParams) -> Self {
        Self {
            config: params.config,
            reporter: params.reporter,
            socket: RwLock::new(None),
            receiver: RwLock::new(None),
            queue: Mutex::new(None),
            pending: tokio::sync::Mutex::new(None),
            listener: LoopLatch::new(),
            writer: LoopLatch::new(),
        }
    }

    /// The bound address, once initialized.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket().and_then(|socket| socket.local_addr().ok())
    }

    fn socket(&self) -> Option<Arc<UdpSocket>> {
        self.socket
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn deliver(&self, packet: Packet) {
        let receiver = self
            .receiver
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match receiver {
            Some(receive) => receive(packet),
            None => debug!(
                event = events::TRANSPORT_NO_RECEIVER,
                component = COMPONENT,
                peer = %packet.peer,
                "dropping datagram, no receiver bound"
            ),
        }
    }

    async fn send(&self, socket: &UdpSocket, packet: Packet) {
        if let Err(err) = socket.send_to(&packet.data, packet.peer).await {
            self.reporter.error(err);
        }
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn init(&self) -> Result<()> {
        let bind = self.config.transport.bind;
        let socket = UdpSocket::bind(bind).await?;
        let local_addr = socket.local_addr()?;

        let (tx, rx) = mpsc::channel(self.config.transport.write_queue_size.max(1));
        *self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tx);
        *self.pending.lock().await = Some(rx);
        *self
            .socket
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(socket));

        info!(
            event = events::TRANSPORT_BOUND,
            component = COMPONENT,
            local_addr = %local_addr,
            "udp transport bound"
        );
        self.reporter.log(format!("udp transport bound to {local_addr}"));
        Ok(())
    }

    fn set_receiver(&self, receiver: ReceiveFn) {
        *self
            .receiver
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(receiver);
    }

    async fn run_listener(&self) {
        let Some(mut guard) = self.listener.enter() else {
            return;
        };
        let Some(socket) = self.socket() else {
            self.reporter.error(HammerError::NotInitialized);
            return;
        };

        let mut buf = vec![0u8; self.config.transport.read_buffer_size];
        loop {
            tokio::select! {
                _ = guard.stopped() => break,
                received = socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => self.deliver(Packet::new(peer, buf[..len].to_vec())),
                    Err(err) => {
                        self.reporter.error(err);
                    }
                },
            }
        }
    }

    async fn stop_listener(&self) -> Result<()> {
        self.listener.stop().await;
        Ok(())
    }

    async fn run_writer(&self) {
        let Some(mut guard) = self.writer.enter() else {
            return;
        };
        let Some(socket) = self.socket() else {
            self.reporter.error(HammerError::NotInitialized);
            return;
        };
        let mut pending = self.pending.lock().await;
        let Some(queue) = pending.as_mut() else {
            return;
        };

        loop {
            tokio::select! {
                _ = guard.stopped() => break,
                packet = queue.recv() => match packet {
                    Some(packet) => self.send(&socket, packet).await,
                    None => break,
                },
            }
        }

        queue.close();
        while let Ok(packet) = queue.try_recv() {
            self.send(&socket, packet).await;
        }
    }

    async fn stop_writer(&self) -> Result<()> {
        self.queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        self.writer.stop().await;
        Ok(())
    }

    async fn write(&self, packet: Packet) -> Result<()> {
        let queue = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(HammerError::WriterStopped)?;
        queue
            .send(packet)
            .await
            .map_err(|_| HammerError::WriterStopped)
    }

    async fn deinit(&self) -> Result<()> {
        self.receiver
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        self.pending.lock().await.take();
        self.socket
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}
