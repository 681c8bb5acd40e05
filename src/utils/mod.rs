// src/utils/mod.rs
pub mod db_connect;
pub mod detection_config;
pub mod env;
pub mod logging;
