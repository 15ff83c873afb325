pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod meeting;
pub mod reputation;
pub mod store;
