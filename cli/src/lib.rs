//! Command-line loader that writes a comment export into a Typecho database.

pub mod cli;
pub mod commands;
pub mod db;
pub mod schema;
