//! Notionslot — contact-form submission handler.
//!
//! Flow:
//! 1. Security headers (redirect + halt on non-POST)
//! 2. Validate submission against the field schema
//! 3. Notify + reply by mail, archive the submission as a Notion page
//!
//! The HTTP server that feeds requests in and the real network transports
//! are host concerns; the core only talks to a [`transport::TransportPort`].

pub mod config;
pub mod envelope;
pub mod error;
pub mod notion;
pub mod processor;
pub mod transport;
