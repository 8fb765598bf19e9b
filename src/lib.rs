#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Storage, sessions, the access guard, page rendering and the route handlers"]
#![doc = "of the Todoforge application. The binary (`main.rs`) reads the configuration,"]
#![doc = "opens both stores and serves [`routes::config`] with a shared [`state::AppState`]."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
