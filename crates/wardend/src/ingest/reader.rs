//! Top-level request driver for the control stream.
//!
//! One [`RequestReader::receive`] call reads exactly one JSON document from
//! the control stream and turns it into a typed [`Request`]. The stream may
//! carry any number of documents back to back; nothing requires end-of-input
//! after a value. Calls are independent and stateless apart from the stream
//! position, and must be serialized by the caller.

use std::io::Read;
use std::os::fd::AsFd;

use serde_json::{Value, de::IoRead};
use tracing::{debug, warn};

use crate::descriptor::DescriptorReceiver;

use super::INGEST_TARGET;
use super::command::{CommandRequest, decode_command};
use super::errors::RequestError;

const KIND_CMD: &str = "Cmd";

/// One decoded control-stream request.
#[derive(Debug)]
pub enum Request {
    /// A command launch request.
    Command(CommandRequest),
    /// The control stream is exhausted; no further requests will arrive.
    Exit,
}

/// Reads typed requests off the connected control stream.
pub struct RequestReader<R: Read, C: AsFd> {
    documents: serde_json::StreamDeserializer<'static, IoRead<R>, Value>,
    descriptors: DescriptorReceiver<C>,
}

impl<R: Read, C: AsFd> RequestReader<R, C> {
    /// Wraps the connected control stream and descriptor channel.
    pub fn new(control: R, descriptor_channel: C) -> Self {
        Self {
            documents: serde_json::Deserializer::from_reader(control).into_iter(),
            descriptors: DescriptorReceiver::new(descriptor_channel),
        }
    }

    /// Reads and decodes the next request.
    ///
    /// Blocks until one complete document arrives and, when the command
    /// requests redirection, until the companion channel delivers the
    /// descriptors. An exhausted stream yields [`Request::Exit`], again on
    /// every subsequent call.
    ///
    /// A parse failure leaves the stream position unreliable, so the reader
    /// delivers no further documents after reporting one: subsequent calls
    /// yield [`Request::Exit`] even when bytes remain on the stream.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] describing the first failure: a parse
    /// error with the parser's position, a schema violation, or a
    /// descriptor-transfer failure. Callers should stop using the
    /// descriptor channel when [`RequestError::is_channel_fatal`] holds.
    pub fn receive(&mut self) -> Result<Request, RequestError> {
        self.next_request().inspect_err(|error| {
            warn!(target: INGEST_TARGET, %error, "request ingestion failed");
        })
    }

    fn next_request(&mut self) -> Result<Request, RequestError> {
        let Some(parsed) = self.documents.next() else {
            debug!(target: INGEST_TARGET, "control stream exhausted");
            return Ok(Request::Exit);
        };
        let document = parsed.map_err(RequestError::parse_failed)?;
        self.dispatch(&document)
    }

    fn dispatch(&mut self, document: &Value) -> Result<Request, RequestError> {
        let Some(object) = document.as_object() else {
            return Err(RequestError::malformed("request document is not an object"));
        };
        // Only the first enumerated key is inspected; the schema leaves
        // objects with more than one key unspecified.
        let Some((kind, payload)) = object.iter().next() else {
            return Err(RequestError::EmptyRequest);
        };
        match kind.as_str() {
            KIND_CMD => decode_command(payload, &mut self.descriptors).map(Request::Command),
            other => Err(RequestError::unknown_kind(other)),
        }
    }
}
