//! PedidoFlex Portal library.
//!
//! This crate provides the portal functionality as a library, allowing it
//! to be driven in-process by the integration tests and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod persist;
pub mod routes;
pub mod services;
pub mod state;
pub mod stores;
