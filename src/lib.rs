#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::io;

use thiserror::Error;

pub mod proto;
pub mod client;
pub mod commands;
pub mod config;
pub mod power;

pub use client::{Connection, ConnectionState};
pub use config::{ConnectOptions, ProjectorRegistry};
pub use power::{PowerControl, PowerOutcome, PowerTarget};
pub use proto::PowerState;

/// TCP port of the projector control service
pub const DEFAULT_PORT: u16 = 7142;

/// General error that can occur while controlling a projector
#[derive(Debug, Error)]
pub enum Error {
    /// Socket failed to connect, send or receive
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),
    /// Operation attempted on a connection that is not open
    #[error("Not connected")]
    NotConnected,
    /// Projector rejected the command or answered with something unexpected
    #[error(transparent)]
    Response(#[from] proto::Error),
    /// Projector registry could not be loaded or queried
    #[error(transparent)]
    Config(#[from] config::Error),
}
