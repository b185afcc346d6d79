//! Fihris bot — a chat front-end over a read-only library catalog.
//!
//! Messages are routed to a handful of canned SQLite queries, formatted as
//! chat text and optionally answered by a language model over the matched
//! rows. The binary wires these pieces to Telegram and a local console.

pub mod catalog;
pub mod comms;
pub mod config;
pub mod error;
pub mod library;
pub mod llm;
pub mod logger;
