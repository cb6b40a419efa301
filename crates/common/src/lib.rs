pub mod error;

pub use error::{WorklogError, WorklogResult};
