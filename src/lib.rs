//! xkcd-search - a faceted search service for the XKCD comic corpus.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod index;
pub mod ingester;
pub mod models;
pub mod repository;
pub mod search;
pub mod server;
pub mod stemmer;
