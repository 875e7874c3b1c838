pub mod config;
pub mod geodesy;
pub mod mission;
pub mod server;
pub mod service;
pub mod types;
pub mod util;
pub mod xml;
