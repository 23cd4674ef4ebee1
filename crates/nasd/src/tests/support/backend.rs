//! Stub credential backend speaking the framed backend protocol over TCP.

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use nas_config::SocketEndpoint;
use nas_protocol::{BackendCommand, Framed, Request, Response};

#[derive(Debug, Default)]
struct Accounts {
    users: Mutex<HashMap<String, (String, u64)>>,
    connections: AtomicUsize,
    hang_up_next: AtomicBool,
}

/// Backend server running on a background thread for the rest of the test.
#[derive(Debug, Clone)]
pub struct StubBackend {
    address: SocketAddr,
    accounts: Arc<Accounts>,
}

impl StubBackend {
    /// Binds an ephemeral port and starts answering connections.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub backend");
        let address = listener.local_addr().expect("stub backend address");
        let accounts = Arc::new(Accounts::default());
        let shared = Arc::clone(&accounts);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                shared.connections.fetch_add(1, Ordering::SeqCst);
                let connection = Arc::clone(&shared);
                thread::spawn(move || serve(stream, &connection));
            }
        });
        Self { address, accounts }
    }

    /// Registers a user with a password and allocation.
    pub fn with_user(self, username: &str, password: &str, quota: u64) -> Self {
        self.accounts
            .users
            .lock()
            .expect("stub users lock")
            .insert(username.to_owned(), (password.to_owned(), quota));
        self
    }

    /// Endpoint clients should connect to.
    pub fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp(self.address.ip().to_string(), self.address.port())
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.accounts.connections.load(Ordering::SeqCst)
    }

    /// Makes the next request close its connection without a reply.
    pub fn hang_up_next_call(&self) {
        self.accounts.hang_up_next.store(true, Ordering::SeqCst);
    }

    /// Allocation recorded for `username`, if registered.
    pub fn quota_of(&self, username: &str) -> Option<u64> {
        self.accounts
            .users
            .lock()
            .expect("stub users lock")
            .get(username)
            .map(|(_, quota)| *quota)
    }
}

fn serve(stream: TcpStream, accounts: &Accounts) {
    let mut framed = Framed::new(stream);
    while let Ok(Some(frame)) = framed.read_frame() {
        if accounts.hang_up_next.swap(false, Ordering::SeqCst) {
            return;
        }
        let reply = Request::decode(&frame).map_or_else(
            |_| Response::failure("malformed request"),
            |request| answer(&request, accounts),
        );
        let payload = reply.encode().expect("encode stub reply");
        if framed.write_frame(&payload).is_err() {
            return;
        }
    }
}

fn answer(request: &Request, accounts: &Accounts) -> Response {
    let mut users = accounts.users.lock().expect("stub users lock");
    let command = BackendCommand::try_from(request.command_id());
    match (command, request.arguments()) {
        (Ok(BackendCommand::CheckCredentials), [username, password]) => {
            let valid = users
                .get(username)
                .is_some_and(|(expected, _)| expected == password);
            Response::success(vec![u8::from(valid)])
        }
        (Ok(BackendCommand::GetAllocatedQuota), [username]) => users
            .get(username)
            .map_or_else(
                || Response::failure("unknown user"),
                |(_, quota)| Response::success(quota.to_string()),
            ),
        (Ok(BackendCommand::AddUser), [username, password, quota]) => match quota.parse() {
            Ok(allocation) if !users.contains_key(username) => {
                users.insert(username.clone(), (password.clone(), allocation));
                Response::success(Vec::new())
            }
            _ => Response::failure("user not added"),
        },
        _ => Response::failure("unsupported call"),
    }
}
