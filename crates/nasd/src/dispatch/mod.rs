//! Framed command dispatch for client connections.
//!
//! Clients send one request frame per command: a command identifier followed
//! by length-prefixed string arguments. The daemon answers each request with
//! exactly one response frame (status byte plus body) before reading the next
//! one. Upload and download extend a command with data frames that belong to
//! the transfer rather than the command loop.
//!
//! ## Commands
//!
//! | id | command           | arguments                             | session |
//! |----|-------------------|---------------------------------------|---------|
//! | 0  | `Upload`          | username, password, path, size        | no      |
//! | 1  | `Download`        | username, password, path              | no      |
//! | 2  | `CreateDirectory` | path                                  | yes     |
//! | 3  | `Remove`          | path                                  | yes     |
//! | 4  | `Rename`          | old path, new path                    | yes     |
//! | 5  | `Login`           | username, password                    | no      |
//! | 6  | `List`            | path                                  | yes     |
//! | 7  | `Info`            | none                                  | yes     |
//!
//! Failures are answered with a short diagnostic; detail goes to the logs.

mod commands;
mod errors;
mod handler;
mod router;
mod services;

pub use self::errors::{CommandError, ConnectionError};
pub use self::handler::DispatchConnectionHandler;
pub use self::router::CommandRouter;
pub use self::services::Services;

#[cfg(test)]
mod tests;
