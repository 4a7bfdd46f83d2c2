//! Client library for the Riffle short-video platform.
//!
//! Layers, bottom up:
//! - `api::tokens`: persistent session-token storage behind a trait.
//! - `api::client`: authenticated HTTP wrapper with transparent
//!   refresh-and-retry on expired sessions.
//! - `api::{auth, posts, comments, users, catalog}`: the domain
//!   endpoint groups.
//! - `feed`: local view state with optimistic toggle mutations.
//! - `commands`: the terminal command handlers.

pub mod api;
pub mod commands;
pub mod feed;
