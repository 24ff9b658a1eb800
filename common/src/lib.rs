pub mod config;
pub mod cookie;
pub mod models;
pub mod utils;

pub use config::*;
pub use cookie::*;
pub use utils::*;
