pub mod block;
pub mod tables;
pub mod tokens;

pub use block::{BlockEncoder, BlockPlan};
pub use tables::BlockType;
pub use tokens::{Symbol, SymbolBlock};
