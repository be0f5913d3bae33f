//! Beacon - minimal HTTP/1.1 server
//!
//! Core library for request parsing, routing and response serialization.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod routes;
pub mod server;
