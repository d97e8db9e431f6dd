pub mod error;

pub use error::{report_warning, FileIOError};
