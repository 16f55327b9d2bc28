//! PedidoFlex Core - Shared domain types.
//!
//! This crate provides the entity definitions and value types used across
//! all PedidoFlex components:
//! - `portal` - The B2B ordering portal (representatives + backoffice)
//! - `cli` - Command-line tools for seeding and account management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, tax identifiers,
//!   emails, and statuses
//! - [`entities`] - The domain records: users, billing entities, products,
//!   cart items, orders, and news posts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entities;
pub mod types;

pub use entities::*;
pub use types::*;
