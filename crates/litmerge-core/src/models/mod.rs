pub mod decision;
pub mod record;
pub mod stats;

pub use decision::*;
pub use record::*;
pub use stats::*;
