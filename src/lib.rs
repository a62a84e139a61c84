pub mod app;
pub mod audit;
pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod order_number;
pub mod order_state;
pub mod response;
pub mod routes;
pub mod scheduler;
pub mod services;
pub mod stamp;
pub mod state;
