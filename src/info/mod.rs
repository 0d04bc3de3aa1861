// Boost INFO configuration format (the syntax used by ODR-DabMux)
pub mod parser;
pub mod tree;

pub use parser::{InfoError, Result};
pub use tree::InfoTree;
