pub mod flags;
pub mod metadata;
pub mod value;

pub use flags::InfoFlags;
pub use metadata::Metadata;
pub use value::{Value, ValueKind};
