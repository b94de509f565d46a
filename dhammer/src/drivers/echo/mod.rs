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

//! UDP echo workload.
//!
//! [`EchoGenerator`] sends sequence-numbered datagrams to a target at a fixed rate.
//! [`EchoHandler`] counts whatever comes back and can optionally echo it.

mod generator;
mod handler;

pub use generator::{EchoGenerator, PAYLOADS_SENT, WRITE_ERRORS};
pub use handler::{EchoHandler, REPLIES_DROPPED, REPLIES_SENT, RESPONSES_RECEIVED};
