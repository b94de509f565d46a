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

use crate::error::Result;
use crate::lifecycle::LoopLatch;
use crate::subsystem::{
    DriverParams, Handler, Packet, Reporter, StatId, StatRecorder, Subsystem, Transport,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub const RESPONSES_RECEIVED: StatId = StatId("responses_received");
pub const REPLIES_SENT: StatId = StatId("replies_sent");
pub const REPLIES_DROPPED: StatId = StatId("replies_dropped");

/// Counts inbound datagrams and, in reply mode, echoes them back to their sender.
pub struct EchoHandler {
    reply: bool,
    transport: Arc<dyn Transport>,
    reporter: Reporter,
    stats: StatRecorder,
    replies: mpsc::Sender<Packet>,
    outbox: Mutex<mpsc::Receiver<Packet>>,
    latch: LoopLatch,
}

impl EchoHandler {
    pub fn new(params: DriverParams) -> Self {
        let handler = &params.config.handler;
        let (replies, outbox) = mpsc::channel(handler.reply_queue_size.max(1));
        Self {
            reply: handler.reply,
            transport: params.transport,
            reporter: params.reporter,
            stats: params.stats,
            replies,
            outbox: Mutex::new(outbox),
            latch: LoopLatch::new(),
        }
    }
}

#[async_trait]
impl Subsystem for EchoHandler {
    async fn init(&self) -> Result<()> {
        if self.reply {
            self.reporter.log("echo handler replying to every datagram");
        }
        Ok(())
    }

    async fn run(&self) {
        let Some(mut guard) = self.latch.enter() else {
            return;
        };
        let mut outbox = self.outbox.lock().await;

        loop {
            tokio::select! {
                biased;
                _ = guard.stopped() => break,
                packet = outbox.recv() => {
                    let Some(packet) = packet else { break };
                    match self.transport.write(packet).await {
                        Ok(()) => {
                            self.stats.record(REPLIES_SENT);
                        }
                        Err(err) => {
                            self.reporter.error(err);
                        }
                    }
                }
            }
        }
    }

    async fn stop(&self) -> Result<()> {
        self.latch.stop().await;
        Ok(())
    }

    async fn deinit(&self) -> Result<()> {
        let mut outbox = self.outbox.lock().await;
        outbox.close();
        while outbox.try_recv().is_ok() {}
        Ok(())
    }
}

impl Handler for EchoHandler {
    fn receive_message(&self, packet: Packet) {
        self.stats.record(RESPONSES_RECEIVED);
        if self.reply && self.replies.try_send(packet).is_err() {
            self.stats.record(REPLIES_DROPPED);
        }
    }
}
