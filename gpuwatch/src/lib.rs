//! Live GPU telemetry client: receives frames from a remote agent over
//! WebSocket, keeps the latest sample and a bounded history window, and
//! notifies subscribers in arrival order.

pub mod app;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod headless;
pub mod history;
pub mod logging;
pub mod normalize;
pub mod profiles;
pub mod reconnect;
pub mod snapshot;
pub mod types;
pub mod ui;
pub mod ws;

pub use connection::{CloseHandle, ConnectionManager, HistoryPolicy, SessionOptions, Step};
pub use error::{ConfigError, ConnectionError, ParseError};
pub use events::{CloseReason, ConnState, Event, SubscriptionId};
pub use types::{RawFrame, Sample, WindowPoint};
