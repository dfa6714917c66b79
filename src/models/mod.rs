pub mod pod;
pub mod report;

pub use pod::*;
pub use report::*;
