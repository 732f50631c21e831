//! Descriptor transfer over the companion Unix channel.
//!
//! For every redirection a command requests, the peer transmits one message
//! carrying a single-byte regular payload and exactly one file descriptor in
//! `SCM_RIGHTS` ancillary data. The channel is a single shared, strictly
//! ordered stream: descriptors must be consumed in the order the peer sends
//! them, input before output, synchronously per command.
//!
//! A failed transfer leaves the channel at an unknown position, so callers
//! should treat it as fatal to the channel rather than retry.

use std::io::{IoSlice, IoSliceMut};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use nix::cmsg_space;
use nix::errno::Errno;
use nix::sys::socket::{
    ControlMessage, ControlMessageOwned, MsgFlags, UnixAddr, recvmsg, sendmsg,
};
use thiserror::Error;
use tracing::debug;

const CHANNEL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::descriptor");

/// Errors raised during descriptor transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The receive call failed at the transport level.
    #[error("receive on descriptor channel failed: {0}")]
    Receive(#[source] Errno),
    /// The send call failed at the transport level.
    #[error("send on descriptor channel failed: {0}")]
    Send(#[source] Errno),
    /// The peer closed the channel before delivering a descriptor.
    #[error("descriptor channel closed by peer")]
    Closed,
    /// The kernel truncated the control message; the descriptor was lost.
    #[error("descriptor control message truncated")]
    Truncated,
    /// The message arrived without a descriptor in its ancillary data.
    #[error("descriptor message carried no descriptor")]
    MissingDescriptor,
}

/// Receives redirection descriptors from the connected companion channel.
#[derive(Debug)]
pub struct DescriptorReceiver<C: AsFd> {
    channel: C,
}

impl<C: AsFd> DescriptorReceiver<C> {
    /// Wraps an already-connected Unix-domain channel.
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    /// Performs one blocking receive for a single descriptor.
    ///
    /// # Errors
    ///
    /// Fails when the transport-level receive fails, the peer has closed
    /// the channel, or the message does not carry exactly the expected
    /// ancillary payload.
    pub fn receive_one(&mut self) -> Result<OwnedFd, TransferError> {
        let mut payload = [0_u8; 1];
        let mut iov = [IoSliceMut::new(&mut payload)];
        let mut ancillary = cmsg_space!(RawFd);

        debug!(target: CHANNEL_TARGET, "waiting for descriptor");
        let message = recvmsg::<UnixAddr>(
            self.channel.as_fd().as_raw_fd(),
            &mut iov,
            Some(&mut ancillary),
            MsgFlags::empty(),
        )
        .map_err(TransferError::Receive)?;

        let mut received = message
            .cmsgs()
            .filter_map(|control| match control {
                ControlMessageOwned::ScmRights(fds) => Some(fds),
                _ => None,
            })
            .flatten()
            // SAFETY: the kernel installed each received descriptor into this
            // process for this message; nothing else owns them yet.
            .map(|fd| unsafe { OwnedFd::from_raw_fd(fd) });

        // Descriptors are wrapped before the failure checks so every error
        // return below closes whatever the kernel already installed.
        let descriptor = received.next();
        // The protocol is one descriptor per message; exhausting the iterator
        // closes any extras the peer smuggled in.
        received.for_each(drop);

        if message.bytes == 0 {
            return Err(TransferError::Closed);
        }
        if message.flags.contains(MsgFlags::MSG_CTRUNC) {
            return Err(TransferError::Truncated);
        }
        let descriptor = descriptor.ok_or(TransferError::MissingDescriptor)?;

        debug!(
            target: CHANNEL_TARGET,
            fd = descriptor.as_raw_fd(),
            "received descriptor"
        );
        Ok(descriptor)
    }

    /// Receives the descriptors the redirect flags request, input first.
    ///
    /// A failed input transfer aborts before the output transfer is
    /// attempted. An input descriptor already received when the output
    /// transfer fails is closed on the way out.
    ///
    /// # Errors
    ///
    /// Propagates the first [`TransferError`] from [`Self::receive_one`].
    pub fn receive_requested(
        &mut self,
        input: bool,
        output: bool,
    ) -> Result<(Option<OwnedFd>, Option<OwnedFd>), TransferError> {
        let input_descriptor = input.then(|| self.receive_one()).transpose()?;
        let output_descriptor = output.then(|| self.receive_one()).transpose()?;
        Ok((input_descriptor, output_descriptor))
    }
}

/// Sends one open descriptor to the peer.
///
/// The message pairs the descriptor with a single ignored payload byte, the
/// shape [`DescriptorReceiver::receive_one`] expects. This is the client
/// half of the protocol.
///
/// # Errors
///
/// Fails when the transport-level send fails.
pub fn send_descriptor<C: AsFd>(
    channel: &C,
    descriptor: BorrowedFd<'_>,
) -> Result<(), TransferError> {
    let payload = [0_u8; 1];
    let iov = [IoSlice::new(&payload)];
    let fds = [descriptor.as_raw_fd()];
    let control = [ControlMessage::ScmRights(&fds)];

    sendmsg::<UnixAddr>(
        channel.as_fd().as_raw_fd(),
        &iov,
        &control,
        MsgFlags::empty(),
        None,
    )
    .map_err(TransferError::Send)?;
    Ok(())
}
