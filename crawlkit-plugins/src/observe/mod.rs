pub mod crawl_stats;
pub mod lifecycle_log;
