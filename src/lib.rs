//! Library crate for intro-quiz-back, exposing modules for binaries and integration tests.

pub mod config;
/// Collaborators reached over the network or the filesystem.
pub mod dao;
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Orchestration of matches, audio and SSE.
pub mod services;
/// Match state, timers and the SSE hub.
pub mod state;
