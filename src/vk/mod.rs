//! VK method API: request descriptions, wire types, and clients.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod request;
pub mod types;

pub use cached_client::CachedVkClient;
pub use client::VkClient;
pub use request::FetchRequest;
