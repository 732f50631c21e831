//! End-to-end behaviour of the request-ingestion layer.
//!
//! These tests play both sides of the wire: a client thread writes JSON
//! documents to the control stream and hands descriptors over the companion
//! channel, while the reader under test ingests them.

use std::io::{Read, Seek, SeekFrom, Write};
use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;
use std::thread;

use rstest::rstest;
use wardend::{Request, RequestError, RequestReader, TransferError, send_descriptor};

fn channel_pair() -> (UnixStream, UnixStream) {
    UnixStream::pair().expect("socketpair")
}

#[rstest]
fn full_session_round_trips_commands_and_descriptor() {
    let (control_tx, control_rx) = channel_pair();
    let (descriptor_tx, descriptor_rx) = channel_pair();

    let client = thread::spawn(move || {
        let mut control = control_tx;
        control
            .write_all(
                concat!(
                    r#"{"Cmd":{"Path":"/bin/cat","Args":["cat"],"Env":{"TERM":"dumb"},"#,
                    r#""RedirInput":true,"RedirOutput":false}}"#,
                    "\n",
                )
                .as_bytes(),
            )
            .expect("write first document");

        let file = tempfile::tempfile().expect("tempfile");
        send_descriptor(&descriptor_tx, file.as_fd()).expect("send descriptor");

        control
            .write_all(
                concat!(
                    r#"{"Cmd":{"Path":"/bin/true","Args":[],"Env":{},"#,
                    r#""RedirInput":false,"RedirOutput":false}}"#,
                )
                .as_bytes(),
            )
            .expect("write second document");
        // Dropping the control half ends the stream.
        file
    });

    let mut requests = RequestReader::new(control_rx, descriptor_rx);

    let Request::Command(mut first) = requests.receive().expect("first request") else {
        panic!("expected a command request");
    };
    assert_eq!(first.path(), "/bin/cat");
    assert_eq!(first.args(), ["cat"]);
    assert_eq!(first.env(), ["TERM=dumb"]);
    assert!(first.redirects_input());
    assert!(!first.redirects_output());

    // The received descriptor is the transmitted one: bytes written through
    // it land in the client's file.
    let input = first.take_input().expect("input descriptor present");
    assert!(first.take_output().is_none());
    let mut redirected = std::fs::File::from(input);
    redirected
        .write_all(b"through the wall")
        .expect("write via received descriptor");

    let Request::Command(second) = requests.receive().expect("second request") else {
        panic!("expected a command request");
    };
    assert_eq!(second.path(), "/bin/true");
    assert!(second.args().is_empty());

    assert!(matches!(requests.receive().expect("exit"), Request::Exit));
    assert!(matches!(
        requests.receive().expect("exit is idempotent"),
        Request::Exit
    ));

    let mut original = client.join().expect("client thread");
    original.seek(SeekFrom::Start(0)).expect("rewind");
    let mut contents = String::new();
    original.read_to_string(&mut contents).expect("read back");
    assert_eq!(contents, "through the wall");
}

#[rstest]
fn redirection_blocks_until_the_descriptor_arrives() {
    let (mut control_tx, control_rx) = channel_pair();
    let (descriptor_tx, descriptor_rx) = channel_pair();

    control_tx
        .write_all(
            concat!(
                r#"{"Cmd":{"Path":"/bin/cat","Args":["cat"],"Env":{},"#,
                r#""RedirInput":true,"RedirOutput":false}}"#,
            )
            .as_bytes(),
        )
        .expect("write document");

    let sender = thread::spawn(move || {
        // Delay the transfer so the reader has to wait for it.
        thread::sleep(std::time::Duration::from_millis(50));
        let file = tempfile::tempfile().expect("tempfile");
        send_descriptor(&descriptor_tx, file.as_fd()).expect("send descriptor");
    });

    let mut requests = RequestReader::new(control_rx, descriptor_rx);
    let Request::Command(mut command) = requests.receive().expect("command") else {
        panic!("expected a command request");
    };
    assert!(command.take_input().is_some());
    sender.join().expect("sender thread");
}

#[rstest]
fn descriptorless_transfer_message_is_channel_fatal() {
    let (mut control_tx, control_rx) = channel_pair();
    let (descriptor_tx, descriptor_rx) = channel_pair();

    control_tx
        .write_all(
            concat!(
                r#"{"Cmd":{"Path":"/bin/cat","Args":["cat"],"Env":{},"#,
                r#""RedirInput":true,"RedirOutput":true}}"#,
            )
            .as_bytes(),
        )
        .expect("write document");
    // A bare payload byte with no ancillary descriptor attached.
    (&descriptor_tx)
        .write_all(&[0])
        .expect("write bare payload byte");

    let mut requests = RequestReader::new(control_rx, descriptor_rx);
    let error = requests.receive().expect_err("input transfer must fail");
    assert!(matches!(
        error,
        RequestError::Transfer(TransferError::MissingDescriptor)
    ));
    assert!(error.is_channel_fatal());
}

#[rstest]
#[case::empty_request("{}", "request object is empty")]
#[case::unknown_kind(r#"{"Foo": {}}"#, "unknown request kind")]
#[case::extra_field(
    r#"{"Cmd":{"Path":"/bin/cat","Args":[],"Env":{},"RedirInput":false,"RedirOutput":false,"Nice":10}}"#,
    "does not conform to schema"
)]
#[case::missing_field(
    r#"{"Cmd":{"Path":"/bin/cat","Args":[],"Env":{},"RedirInput":false}}"#,
    "does not conform to schema"
)]
fn rejected_documents_report_their_failure(#[case] document: &str, #[case] needle: &str) {
    let (mut control_tx, control_rx) = channel_pair();
    let (_descriptor_tx, descriptor_rx) = channel_pair();

    control_tx
        .write_all(document.as_bytes())
        .expect("write document");
    drop(control_tx);

    let mut requests = RequestReader::new(control_rx, descriptor_rx);
    let error = requests.receive().expect_err("document must be rejected");
    assert!(
        error.to_string().contains(needle),
        "expected '{needle}' in '{error}'"
    );
    assert!(!error.is_channel_fatal());
}
