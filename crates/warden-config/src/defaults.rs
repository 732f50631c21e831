//! Platform defaults for channel endpoints and logging.

use std::env;

use camino::Utf8PathBuf;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::socket::SocketEndpoint;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Computes the default control-stream endpoint.
#[must_use]
pub fn default_control_endpoint() -> SocketEndpoint {
    endpoint_in_base("control.sock")
}

/// Computes the default descriptor-channel endpoint.
#[must_use]
pub fn default_descriptor_endpoint() -> SocketEndpoint {
    endpoint_in_base("descriptors.sock")
}

fn endpoint_in_base(file_name: &str) -> SocketEndpoint {
    SocketEndpoint::new(base_directory().join(file_name))
}

#[cfg(unix)]
fn base_directory() -> Utf8PathBuf {
    if let Some(dir) = runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        return dir.join("warden");
    }
    // Without a runtime directory the sockets land in a per-user namespace
    // under the system temp directory.
    let temp = Utf8PathBuf::from_path_buf(env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"));
    temp.join("warden").join(format!("uid-{}", unsafe { geteuid() }))
}

#[cfg(not(unix))]
fn base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("."))
        .join("warden")
}
