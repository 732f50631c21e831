//! JSON request ingestion for the warden daemon.
//!
//! This module turns control-stream bytes into typed requests. The
//! [`RequestReader`] drives the flow: it parses one JSON document per call,
//! dispatches on the request kind, and hands `Cmd` payloads to the decoder,
//! which validates the strict schema and collects any redirection
//! descriptors from the companion channel.

mod command;
mod errors;
mod reader;
mod values;

pub use command::CommandRequest;
pub use errors::RequestError;
pub use reader::{Request, RequestReader};

pub(crate) const INGEST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::ingest");
