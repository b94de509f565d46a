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

//! Wire transports.
//!
//! The orchestrator talks to a transport only through
//! [`Transport`](crate::subsystem::Transport). [`UdpTransport`] is the one shipped with
//! the crate and the default chosen by [`Hammer::new`](crate::Hammer::new).

mod udp;

pub use udp::UdpTransport;
