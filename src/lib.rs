pub mod admin;
pub mod card;
pub mod config;
pub mod housing;
pub mod pipeline;
pub mod process;
