pub mod normalize;
pub mod types;

pub use types::*;
