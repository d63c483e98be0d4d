pub mod error;
pub mod types;
pub mod version;

pub use error::StrataError;
pub use types::Result;
pub use version::{Era, IdSpace, ProtocolVersion, StorageClass};
