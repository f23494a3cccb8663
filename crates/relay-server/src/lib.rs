//! # relay-server
//!
//! Axum HTTP + `WebSocket` front end for the broadcast hub.
//!
//! - `GET /stream`: `WebSocket` subscription; first frame is a JSON `Connect`,
//!   after which the hub pushes `Message` frames
//! - `POST /broadcast`: JSON `Message` in, `{}` out once the round completes
//! - `GET /health`, `GET /metrics`: liveness and Prometheus text
//! - Graceful shutdown via `CancellationToken`; every subscription holds a
//!   child token of the server's

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod stream;

pub use config::ServerConfig;
pub use server::RelayServer;
