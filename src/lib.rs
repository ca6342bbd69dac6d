pub mod composer;
pub mod config;
pub mod error;
pub mod generations;
pub mod models;
pub mod routes;
pub mod seed;
pub mod store;
pub mod svg;
