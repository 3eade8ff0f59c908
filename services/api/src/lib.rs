pub mod adapters;
pub mod config;
pub mod draft;
pub mod error;
pub mod web;
