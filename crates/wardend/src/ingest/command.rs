//! Decoding of `Cmd` payloads into fully-owned launch requests.
//!
//! The schema is strict: exactly the five documented fields with exactly
//! the documented types. Decoding proceeds shape and flags first, then the
//! argument vector, then the environment, and finally the descriptor
//! transfers gated by the redirect flags. A failure at any stage drops
//! everything built so far, including descriptors already received.

use std::os::fd::{AsFd, OwnedFd};

use serde_json::{Map, Value};
use tracing::debug;

use crate::descriptor::DescriptorReceiver;

use super::INGEST_TARGET;
use super::errors::RequestError;
use super::values::{load_argv, load_envp, load_flag, load_text};

const FIELD_PATH: &str = "Path";
const FIELD_ARGS: &str = "Args";
const FIELD_ENV: &str = "Env";
const FIELD_REDIR_INPUT: &str = "RedirInput";
const FIELD_REDIR_OUTPUT: &str = "RedirOutput";

const KNOWN_FIELDS: [&str; 5] = [
    FIELD_PATH,
    FIELD_ARGS,
    FIELD_ENV,
    FIELD_REDIR_INPUT,
    FIELD_REDIR_OUTPUT,
];

/// A fully-decoded command launch request.
///
/// Values of this type only come out of a successful decode: the path,
/// argument vector, environment, and every descriptor the redirect flags
/// requested are all present. The consumer takes the descriptors out with
/// [`Self::take_input`]/[`Self::take_output`] before spawning; descriptors
/// still held when the request is dropped are closed.
#[derive(Debug)]
pub struct CommandRequest {
    path: String,
    args: Vec<String>,
    env: Vec<String>,
    redirect_input: bool,
    redirect_output: bool,
    input: Option<OwnedFd>,
    output: Option<OwnedFd>,
}

impl CommandRequest {
    /// Executable path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Ordered argument vector. By caller convention the first element
    /// repeats the path; this is not enforced here.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Environment entries in `KEY=VALUE` form.
    #[must_use]
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Whether stdin redirection was requested.
    #[must_use]
    pub fn redirects_input(&self) -> bool {
        self.redirect_input
    }

    /// Whether stdout redirection was requested.
    #[must_use]
    pub fn redirects_output(&self) -> bool {
        self.redirect_output
    }

    /// Takes ownership of the received stdin descriptor, if any.
    pub fn take_input(&mut self) -> Option<OwnedFd> {
        self.input.take()
    }

    /// Takes ownership of the received stdout descriptor, if any.
    pub fn take_output(&mut self) -> Option<OwnedFd> {
        self.output.take()
    }
}

/// Decodes a `Cmd` payload, receiving requested descriptors on the way.
pub(crate) fn decode_command<C: AsFd>(
    value: &Value,
    descriptors: &mut DescriptorReceiver<C>,
) -> Result<CommandRequest, RequestError> {
    let Some(object) = value.as_object() else {
        return Err(RequestError::schema_violation("Cmd payload is not an object"));
    };
    for field in object.keys() {
        if !KNOWN_FIELDS.contains(&field.as_str()) {
            return Err(RequestError::schema_violation(format!(
                "unexpected field '{field}'"
            )));
        }
    }

    let path = load_text(require_field(object, FIELD_PATH)?, FIELD_PATH)?;
    let redirect_input = load_flag(require_field(object, FIELD_REDIR_INPUT)?, FIELD_REDIR_INPUT)?;
    let redirect_output = load_flag(
        require_field(object, FIELD_REDIR_OUTPUT)?,
        FIELD_REDIR_OUTPUT,
    )?;
    let args = load_argv(require_field(object, FIELD_ARGS)?)?;
    let env = load_envp(require_field(object, FIELD_ENV)?)?;

    // Blocks until the peer delivers every requested descriptor.
    let (input, output) = descriptors.receive_requested(redirect_input, redirect_output)?;

    debug!(
        target: INGEST_TARGET,
        path = %path,
        args = args.len(),
        env = env.len(),
        redirect_input,
        redirect_output,
        "decoded command request"
    );

    Ok(CommandRequest {
        path,
        args,
        env,
        redirect_input,
        redirect_output,
        input,
        output,
    })
}

fn require_field<'document>(
    object: &'document Map<String, Value>,
    field: &str,
) -> Result<&'document Value, RequestError> {
    object
        .get(field)
        .ok_or_else(|| RequestError::schema_violation(format!("missing field '{field}'")))
}
