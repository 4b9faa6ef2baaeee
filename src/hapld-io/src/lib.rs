pub mod parse;
pub mod read;
pub mod write;

pub use read::{FamilyRecord, InputFormat, NormalizedRow, NormalizedTable};
pub use write::TableWriter;
