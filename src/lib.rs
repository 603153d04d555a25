//! merchantcache library
//!
//! Read-through TTL cache and merchant/menu aggregation over a headless CMS
//! REST API. The binary in `main.rs` is a thin command-line caller.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
