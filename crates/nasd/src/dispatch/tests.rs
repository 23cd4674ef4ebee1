//! Unit tests for the dispatch loop over an in-memory stream.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use nas_protocol::{
    BackendCommand, CommandId, DirectoryListing, Framed, Response, TRANSFER_CHUNK_BYTES,
    UPLOAD_READY,
};
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

use super::errors::ConnectionError;
use super::handler::DispatchConnectionHandler;
use super::services::Services;
use crate::backend::{BackendError, Directory};
use crate::tests::support::{Duplex, MockAccounts, accounts, decode_response, request_frame};

struct Harness {
    base: TempDir,
}

impl Harness {
    fn base(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.base.path().to_path_buf()).expect("utf8 temp dir")
    }

    fn user_root(&self) -> Utf8PathBuf {
        self.base().join("alice")
    }

    fn run(
        &self,
        directory: MockAccounts,
        frames: Vec<Vec<u8>>,
    ) -> (Result<(), ConnectionError>, Vec<Vec<u8>>) {
        let shared: Arc<dyn Directory> = Arc::new(directory);
        let services = Services::new(shared, self.base());
        let handler = DispatchConnectionHandler::new(services, 1 << 20, None);
        let mut framed = Framed::new(Duplex::with_frames(frames));
        let result = handler.serve(&mut framed);
        (result, framed.get_ref().written_frames())
    }

    fn responses(&self, directory: MockAccounts, frames: Vec<Vec<u8>>) -> Vec<Response> {
        let (result, written) = self.run(directory, frames);
        result.expect("loop should end cleanly");
        written.iter().map(|frame| decode_response(frame)).collect()
    }
}

#[fixture]
fn harness() -> Harness {
    Harness {
        base: TempDir::new().expect("storage base"),
    }
}

fn login() -> Vec<u8> {
    request_frame(CommandId::Login, &["alice", "secret"])
}

fn upload_request(path: &str, size: usize) -> Vec<u8> {
    request_frame(
        CommandId::Upload,
        &["alice", "secret", path, &size.to_string()],
    )
}

fn assert_failure(response: &Response, diagnostic: &str) {
    assert!(!response.is_success(), "expected failure, got {response:?}");
    assert_eq!(response.body_text(), diagnostic);
}

fn write_file(root: &Utf8Path, name: &str, len: usize) {
    fs::create_dir_all(root).expect("create user root");
    fs::write(root.join(name), vec![b'x'; len]).expect("seed file");
}

#[rstest]
#[case::upload(CommandId::Upload, &["alice", "secret", "a.txt"][..])]
#[case::download(CommandId::Download, &["alice", "secret"][..])]
#[case::login(CommandId::Login, &["alice"][..])]
#[case::info(CommandId::Info, &["extra"][..])]
#[case::rename(CommandId::Rename, &["a.txt"][..])]
#[case::list(CommandId::List, &[][..])]
#[case::create_directory(CommandId::CreateDirectory, &[][..])]
#[case::remove(CommandId::Remove, &["a", "b"][..])]
fn wrong_argument_counts_never_reach_the_backend(
    harness: Harness,
    #[case] command: CommandId,
    #[case] arguments: &[&str],
) {
    let mut directory = MockAccounts::new();
    directory.expect_check_credentials().never();
    directory.expect_allocated_quota().never();

    let responses = harness.responses(directory, vec![request_frame(command, arguments)]);

    assert_eq!(responses.len(), 1);
    assert_failure(&responses[0], "invalid number of arguments");
}

#[rstest]
#[case::create_directory(CommandId::CreateDirectory, &["made", "extra"][..])]
#[case::create_directory_bare(CommandId::CreateDirectory, &[][..])]
#[case::remove(CommandId::Remove, &["a", "b"][..])]
#[case::remove_bare(CommandId::Remove, &[][..])]
#[case::rename(CommandId::Rename, &["a", "made", "extra"][..])]
#[case::upload(CommandId::Upload, &["alice", "secret", "made"][..])]
fn wrong_argument_counts_leave_storage_untouched(
    harness: Harness,
    #[case] command: CommandId,
    #[case] arguments: &[&str],
) {
    write_file(&harness.user_root(), "a", 4);
    write_file(&harness.user_root(), "b", 4);

    let responses = harness.responses(
        accounts(1000),
        vec![login(), request_frame(command, arguments)],
    );

    assert_eq!(responses.len(), 2);
    assert_failure(&responses[1], "invalid number of arguments");
    assert!(harness.user_root().join("a").is_file());
    assert!(harness.user_root().join("b").is_file());
    assert!(!harness.user_root().join("made").exists());
    assert!(!harness.user_root().join("extra").exists());
}

#[rstest]
#[case::create_directory(CommandId::CreateDirectory, &["docs"][..])]
#[case::remove(CommandId::Remove, &["a.txt"][..])]
#[case::rename(CommandId::Rename, &["a.txt", "b.txt"][..])]
#[case::list(CommandId::List, &[""][..])]
#[case::info(CommandId::Info, &[][..])]
fn session_commands_require_login(
    harness: Harness,
    #[case] command: CommandId,
    #[case] arguments: &[&str],
) {
    let responses = harness.responses(accounts(1000), vec![request_frame(command, arguments)]);

    assert_failure(&responses[0], "user is not authenticated");
    assert!(!harness.user_root().exists());
}

#[rstest]
fn failed_login_leaves_session_unauthenticated(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![
            request_frame(CommandId::Login, &["alice", "wrong"]),
            request_frame(CommandId::List, &[""]),
        ],
    );

    assert_failure(&responses[0], "invalid username or password");
    assert_failure(&responses[1], "user is not authenticated");
}

#[rstest]
fn login_creates_user_root(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![login(), request_frame(CommandId::List, &["."])],
    );

    assert!(responses[0].is_success());
    assert_eq!(responses[0].body_text(), "success");
    assert!(harness.user_root().is_dir());
    assert_eq!(responses[1].body_text(), "[]");
}

#[rstest]
fn info_reports_remaining_quota(harness: Harness) {
    write_file(&harness.user_root(), "photo.jpg", 1200);

    let responses = harness.responses(
        accounts(5000),
        vec![login(), request_frame(CommandId::Info, &[])],
    );

    assert!(responses[1].is_success());
    assert_eq!(responses[1].body_text(), "3800");
}

#[rstest]
fn upload_within_quota_is_stored(harness: Harness) {
    write_file(&harness.user_root(), "existing.bin", 800);
    let content = vec![3_u8; 150];

    let responses = harness.responses(
        accounts(1000),
        vec![upload_request("new.bin", content.len()), content.clone()],
    );

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].body_text(), UPLOAD_READY);
    assert!(responses[1].is_success());
    assert_eq!(responses[1].body_text(), "150");
    let stored = fs::read(harness.user_root().join("new.bin")).expect("stored upload");
    assert_eq!(stored, content);
}

#[rstest]
fn upload_beyond_quota_is_refused(harness: Harness) {
    write_file(&harness.user_root(), "existing.bin", 800);

    let responses = harness.responses(accounts(1000), vec![upload_request("new.bin", 300)]);

    assert_eq!(responses.len(), 1);
    assert_failure(&responses[0], "no memory for the upload");
    assert!(!harness.user_root().join("new.bin").exists());
}

#[rstest]
#[case::negative("-5")]
#[case::word("lots")]
#[case::empty("")]
fn upload_rejects_non_numeric_sizes(harness: Harness, #[case] size: &str) {
    let responses = harness.responses(
        accounts(1000),
        vec![request_frame(
            CommandId::Upload,
            &["alice", "secret", "a.txt", size],
        )],
    );

    assert_failure(&responses[0], "invalid size");
}

#[rstest]
fn upload_checks_credentials_before_size(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![request_frame(
            CommandId::Upload,
            &["alice", "wrong", "a.txt", "lots"],
        )],
    );

    assert_failure(&responses[0], "user is not authenticated");
}

#[rstest]
fn download_with_wrong_password_is_unauthenticated(harness: Harness) {
    write_file(&harness.user_root(), "secret.txt", 6);
    let responses = harness.responses(
        accounts(1000),
        vec![
            request_frame(CommandId::Download, &["alice", "wrong", "secret.txt"]),
            request_frame(CommandId::Download, &["mallory", "secret", "secret.txt"]),
        ],
    );

    assert_eq!(responses.len(), 2);
    assert_failure(&responses[0], "user is not authenticated");
    assert_failure(&responses[1], "user is not authenticated");
}

#[rstest]
fn upload_rejects_escaping_paths(harness: Harness) {
    let responses = harness.responses(accounts(1000), vec![upload_request("../evil.txt", 4)]);

    assert_failure(&responses[0], "bad path");
    assert!(!harness.base().join("evil.txt").exists());
}

#[rstest]
fn large_files_round_trip_in_chunks(harness: Harness) {
    let content: Vec<u8> = (0..=250_u8)
        .cycle()
        .take(TRANSFER_CHUNK_BYTES * 2 + 17)
        .collect();
    let mut frames = vec![upload_request("nested/dir/big.bin", content.len())];
    frames.extend(content.chunks(TRANSFER_CHUNK_BYTES).map(<[u8]>::to_vec));
    frames.push(request_frame(
        CommandId::Download,
        &["alice", "secret", "nested/dir/big.bin"],
    ));

    let (result, written) = harness.run(accounts(1_000_000), frames);

    result.expect("loop should end cleanly");
    let acknowledgement = decode_response(&written[1]);
    assert_eq!(acknowledgement.body_text(), content.len().to_string());
    let header = decode_response(&written[2]);
    assert!(header.is_success());
    assert_eq!(header.body_text(), content.len().to_string());
    let data: Vec<u8> = written[3..].concat();
    assert_eq!(written.len(), 6, "three data frames expected");
    assert_eq!(data, content);
}

#[rstest]
fn empty_uploads_need_no_data_frames(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![upload_request("empty.txt", 0), login()],
    );

    assert_eq!(responses[0].body_text(), UPLOAD_READY);
    assert_eq!(responses[1].body_text(), "0");
    assert_eq!(responses[2].body_text(), "success");
    assert!(harness.user_root().join("empty.txt").is_file());
}

#[rstest]
fn oversized_data_frame_ends_the_connection(harness: Harness) {
    let (result, written) = harness.run(
        accounts(1000),
        vec![upload_request("a.txt", 4), b"too many bytes".to_vec(), login()],
    );

    assert!(matches!(result, Err(ConnectionError::Transfer(_))));
    assert_eq!(written.len(), 1, "only the ready response is sent");
    assert!(!harness.user_root().join("a.txt").exists());
}

#[rstest]
fn truncated_upload_ends_the_connection(harness: Harness) {
    let (result, _written) = harness.run(
        accounts(1000),
        vec![upload_request("a.txt", 10), b"four".to_vec()],
    );

    assert!(matches!(result, Err(ConnectionError::Transfer(_))));
    assert!(!harness.user_root().join("a.txt").exists());
}

#[rstest]
fn missing_download_reports_internal_error(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![request_frame(
            CommandId::Download,
            &["alice", "secret", "absent.txt"],
        )],
    );

    assert_eq!(responses.len(), 1);
    assert_failure(&responses[0], "internal error");
}

#[rstest]
fn rename_moves_files_within_root(harness: Harness) {
    write_file(&harness.user_root(), "a.txt", 3);

    let responses = harness.responses(
        accounts(1000),
        vec![
            login(),
            request_frame(CommandId::Rename, &["a.txt", "b.txt"]),
            request_frame(CommandId::Rename, &["b.txt", "../x"]),
        ],
    );

    assert!(responses[1].is_success());
    assert!(responses[1].body().is_empty());
    assert_failure(&responses[2], "bad path");
    assert!(harness.user_root().join("b.txt").is_file());
    assert!(!harness.base().join("x").exists());
}

#[rstest]
fn percent_signs_name_files_literally(harness: Harness) {
    write_file(&harness.user_root(), "x%41.txt", 2);
    let content = b"encoded".to_vec();

    let responses = harness.responses(
        accounts(1000),
        vec![
            login(),
            request_frame(CommandId::List, &[""]),
            request_frame(CommandId::Remove, &["x%41.txt"]),
            upload_request("y%2541", content.len()),
            content.clone(),
        ],
    );

    let listing = DirectoryListing::from_bytes(responses[1].body()).expect("listing json");
    assert!(listing.get("x%41.txt").is_some());
    assert!(responses[2].is_success(), "remove failed: {:?}", responses[2]);
    assert!(!harness.user_root().join("x%41.txt").exists());
    assert!(!harness.user_root().join("xA.txt").exists());
    assert_eq!(responses[4].body_text(), content.len().to_string());
    assert_eq!(
        fs::read(harness.user_root().join("y%2541")).expect("literal upload name"),
        content
    );
}

#[rstest]
fn encoded_traversal_is_refused(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![
            login(),
            request_frame(CommandId::CreateDirectory, &["%2e%2e/escaped"]),
        ],
    );

    assert_failure(&responses[1], "bad path");
    assert!(!harness.base().join("escaped").exists());
}

#[rstest]
fn directories_are_created_listed_and_removed(harness: Harness) {
    write_file(&harness.user_root().join("docs"), "notes.txt", 5);

    let responses = harness.responses(
        accounts(1000),
        vec![
            login(),
            request_frame(CommandId::CreateDirectory, &["photos/2024"]),
            request_frame(CommandId::List, &[""]),
            request_frame(CommandId::Remove, &["docs"]),
            request_frame(CommandId::Remove, &[""]),
        ],
    );

    assert!(responses[1].is_success());
    let listing = DirectoryListing::from_bytes(responses[2].body()).expect("listing json");
    let names: Vec<_> = listing
        .entries()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(names, ["docs", "photos"]);
    assert!(responses[3].is_success());
    assert!(!harness.user_root().join("docs").exists());
    assert_failure(&responses[4], "bad path");
    assert!(harness.user_root().is_dir());
}

#[rstest]
fn listings_are_json_arrays_of_entries(harness: Harness) {
    write_file(&harness.user_root(), "b.txt", 7);
    fs::create_dir(harness.user_root().join("a")).expect("seed directory");

    let responses = harness.responses(
        accounts(1000),
        vec![login(), request_frame(CommandId::List, &[""])],
    );

    let body: serde_json::Value =
        serde_json::from_slice(responses[1].body()).expect("listing json");
    assert_eq!(
        body,
        json!([
            {"name": "a", "size": 0, "kind": "directory"},
            {"name": "b.txt", "size": 7, "kind": "file"},
        ])
    );
}

#[rstest]
fn malformed_and_unknown_requests_keep_the_loop_running(harness: Harness) {
    let responses = harness.responses(
        accounts(1000),
        vec![
            vec![CommandId::Login.id(), 0, 0, 0, 9, b'a'],
            request_frame(9_u8, &[]),
            login(),
        ],
    );

    assert_failure(&responses[0], "malformed request");
    assert_failure(&responses[1], "unknown command");
    assert_eq!(responses[2].body_text(), "success");
}

#[rstest]
fn backend_failures_report_internal_error(harness: Harness) {
    let mut directory = MockAccounts::new();
    directory.expect_check_credentials().returning(|_, _| {
        Err(BackendError::Closed {
            command: BackendCommand::CheckCredentials,
        })
    });

    let responses = harness.responses(directory, vec![login(), login()]);

    assert_failure(&responses[0], "internal error");
    assert_failure(&responses[1], "internal error");
}
