pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod error;
pub mod model;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod utils;
