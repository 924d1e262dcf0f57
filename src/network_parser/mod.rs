pub mod api_url;
pub mod network;
