pub mod swap;
pub mod tokens;

pub use swap::*;
pub use tokens::*;
