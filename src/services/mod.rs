pub mod query_cache;
pub mod toast;
