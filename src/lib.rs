pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod oauth;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod version;
