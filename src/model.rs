pub mod position;
pub mod prediction;
pub mod stop;

pub use position::*;
pub use prediction::*;
pub use stop::*;
