pub mod matcher;
pub mod window;

pub use matcher::{Lz77Matcher, MatchParams};
pub use window::SlidingWindow;
