// MIT License
// Copyright 2023--present additive developers

//! gRPC transport to the additive server.
//!
//! This module is only compiled when the `rpc` Cargo feature is enabled.
//!
//! ## Stub
//!
//! [`stub::AdditiveStub`] issues the raw async calls of the simulation,
//! materials and about services over a `tonic` channel, using the messages in
//! [`crate::proto`]. Transport failures come back as `tonic::Status`.
//!
//! ## Client
//!
//! [`client::AdditiveClient`] owns a tokio runtime and a stub and exposes one
//! blocking method per operation. It turns value objects into requests,
//! follows the progress stream, and builds the summary from the final
//! payload. Transport errors are surfaced unchanged as [`crate::Error::Rpc`]
//! or [`crate::Error::Transport`].

pub mod client;
pub mod stub;

pub use client::AdditiveClient;
pub use stub::AdditiveStub;
