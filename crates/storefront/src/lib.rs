//! Bazaar storefront library.
//!
//! Cart, wishlist, checkout, reviews and profiles for two kinds of shopper:
//! registered accounts backed by `PostgreSQL`, and zero-signup demo
//! identities whose data lives in an in-memory session store.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod demo;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
