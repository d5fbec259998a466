pub mod api;
pub mod bridge;
pub mod client;
pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod gid;
pub mod model;
pub mod pages;
pub mod picker;
pub mod telemetry;
