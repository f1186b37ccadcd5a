pub mod fragment_cache;
