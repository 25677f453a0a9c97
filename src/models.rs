mod header;
mod property;
mod record;

pub use header::*;
pub use property::*;
pub use record::*;
