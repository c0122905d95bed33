// haui-api: Async Rust client for the home-automation hub (WebSocket + REST)

pub mod error;
pub mod protocol;
pub mod rest;
pub mod websocket;

pub use error::Error;
pub use protocol::{
    EventPayload, InboundMessage, OutboundMessage, ResultError, StateChangedData,
};
pub use rest::{RestClient, StateRecord};
pub use websocket::{Session, SessionEvent, SessionSender};
