pub mod config;
pub mod handlers;
pub mod models;
pub mod resolver;
pub mod services;
pub mod startup;
pub mod strategy;
