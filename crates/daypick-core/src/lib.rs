//! Core types, store traits and daily-pick logic for daypick.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::IdentityStore`] and
//! [`store::PickStore`]; the services in [`submit`], [`collage`] and [`like`]
//! are generic over them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod collage;
pub mod day;
pub mod error;
pub mod identity;
pub mod like;
pub mod pick;
pub mod resolve;
pub mod store;
pub mod submit;

pub use error::{Error, Result};
