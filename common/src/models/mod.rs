pub mod graph;
pub mod session;

pub use graph::*;
pub use session::*;
