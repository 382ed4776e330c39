//! # dbot-core
//!
//! Core types and traits for the bridge: [`Bot`] (outbound transport), [`Handler`] (host-side
//! message processing), message and reply-chain types, and tracing initialization.
//! Transport-agnostic; used by dbot-telegram, handler-chain and dbot-cli.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use error::{DbotError, Result};
pub use logger::init_tracing;
pub use types::{
    Chat, Handler, HandlerResponse, ImageSource, Message, MessageChain, MessageKind, Segment,
    ToCoreMessage, ToCoreUser, User,
};
