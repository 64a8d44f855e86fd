pub mod auth;
pub mod conversation;
pub mod db;
pub mod directory;
pub mod error;
pub mod message;
pub mod middleware;
pub mod participant;
pub mod routes;
pub mod state;
pub mod store;
