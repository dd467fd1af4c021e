#![deny(missing_docs)]
//! bw_core: shared building blocks for the Bankwatch console
//! (config, logging, backend API model and client, sync engine).

/// Configuration helpers (AppId, dirs, load_or_init, backend address).
pub mod cfg;
/// Typed payload model and route table for the backend API.
pub mod api;
/// HTTP client for the backend API.
pub mod client;
/// Error taxonomy for backend fetches.
pub mod error;
/// Tracing/log initialization helpers.
pub mod logx;
/// Live-state synchronization engine (pollers, stores, commands).
pub mod sync;
