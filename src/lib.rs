pub mod activity;
pub mod cache;
pub mod config;
pub mod export;
pub mod fetch;
pub mod harvest;
pub mod logging;
pub mod vk;
