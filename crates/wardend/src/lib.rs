//! Request-ingestion layer for the warden daemon.
//!
//! Warden executes privileged commands on behalf of an unprivileged peer.
//! This crate covers the ingestion side of that contract: it reads JSON
//! command documents from a connected control stream, validates them against
//! a strict schema, materializes the launch arguments and environment, and
//! receives already-open file descriptors over a companion Unix channel for
//! stdin/stdout redirection.
//!
//! The transport wiring (binding and connecting the two channels) and the
//! process spawner that consumes a decoded [`CommandRequest`] live outside
//! this crate. The caller drives ingestion by calling
//! [`RequestReader::receive`] in a loop until it yields [`Request::Exit`].
//!
//! The model is single-threaded and blocking throughout: one `receive` call
//! parses one document and, when redirection is requested, blocks until the
//! peer delivers the descriptors. The descriptor channel is strictly FIFO,
//! so callers must serialize calls rather than interleave requests.

pub mod descriptor;
pub mod ingest;
pub mod telemetry;

pub use descriptor::{DescriptorReceiver, TransferError, send_descriptor};
pub use ingest::{CommandRequest, Request, RequestError, RequestReader};
pub use telemetry::{TelemetryError, TelemetryHandle};
