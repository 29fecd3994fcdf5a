pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod isolate;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod sink;
pub mod table;
