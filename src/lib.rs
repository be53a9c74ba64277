pub mod auth;
pub mod board;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
pub mod templates_structs;
