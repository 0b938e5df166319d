//! HTTP surface for voicegate-rs
//!
//! Webhook endpoints for the voice provider, static audio hosting, and the
//! operator's maintenance endpoints.

pub mod admin;
pub mod handlers;
pub mod server;

pub use server::ApiServer;
