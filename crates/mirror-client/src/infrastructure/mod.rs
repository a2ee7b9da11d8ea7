//! Infrastructure layer for the mirror client.
//!
//! Contains the adapters behind the application layer's collaborator
//! traits.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `mirror_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`control`** – `StreamControlChannel`, which writes encoded control
//!   messages to any `AsyncWrite`, one whole message per lock.
//!
//! - **`video`** – Reads the stream metadata block and parses video packets
//!   from any `AsyncRead`.
//!
//! - **`network`** – `TcpTransport` (video socket, then control socket, to a
//!   forwarded mirroring server) and `ForwardedServerDiscovery`.
//!
//! - **`decoder`** – A bounded-channel decoder sink whose consumer task
//!   keeps frame statistics.
//!
//! - **`surface`** – A headless rendering surface for running without a UI.
//!
//! - **`storage`** – TOML configuration persistence.
//!
//! - **`mock`** – Recording doubles of every collaborator, for tests.

pub mod control;
pub mod decoder;
pub mod mock;
pub mod network;
pub mod storage;
pub mod surface;
pub mod video;
