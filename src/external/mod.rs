pub mod http_client;
pub mod stocks_api;
