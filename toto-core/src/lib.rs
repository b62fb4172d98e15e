pub mod analysis;
pub mod chain;
pub mod check;
pub mod config;
pub mod entity;
pub mod models;
pub mod projection;
pub mod ranking;
pub mod sort;
pub mod stats;
