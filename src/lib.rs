pub mod brush;
pub mod config;
pub mod error;
pub mod fill;
pub mod geometry;
pub mod gesture;
pub mod logging;
pub mod palette;
pub mod path;
pub mod surface;
pub mod tools;
pub mod viewport;
pub use error::{EngineError, EngineResult};
