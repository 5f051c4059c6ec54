pub mod utils;
pub mod cache;
