//! Crawl election pages for candidates who attended a given school.
//!
//! Region overview pages link to race pages, race pages link to candidate
//! pages, and candidate pages carry the biographical facts. See
//! [`pipeline::Pipeline`] for the phase order.

pub mod aggregate;
pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod pipeline;
pub mod regions;
pub mod store;
pub mod types;
