pub mod env;
pub mod table;

pub use env::*;
pub use table::*;
