// src/scrape/sources/mod.rs
pub mod github_trending;
pub mod x_search;
