//! EcoFinds: a second-hand marketplace.
//!
//! The server half is an actix-web REST API over MongoDB (`routes`, services,
//! `db`). The `client` module holds the browser-side logic: cart, checkout and
//! catalog filtering.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod orders;
pub mod routes;
pub mod state;
pub mod store;
pub mod upload;
