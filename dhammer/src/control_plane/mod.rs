//! Control plane.
//!
//! A minimal HTTP/1.1 surface over the running Generator and Statistics:
//!
//! - `GET /stats` renders the statistics snapshot as `text/plain`.
//! - `PUT /update` applies a JSON object of live parameter changes to the generator.
//!
//! The listener is bound during `Hammer::init` and served in the foreground of
//! `Hammer::run`. Stopping it waits a bounded grace period for in-flight requests.

mod http;
mod server;

pub(crate) use server::{ControlServer, ControlState};
pub use server::SHUTDOWN_GRACE;
