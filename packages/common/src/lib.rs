pub mod error;
pub mod filesystem;
pub mod paths;

pub use error::*;
pub use filesystem::*;
pub use paths::*;
