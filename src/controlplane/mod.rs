//! Resolution Control Plane
//!
//! Coordinates profile resolution across the registered storage backends:
//! capability adapters, the backend registry, the fallback policy and the
//! resolution engine, plus the API that exposes them.

pub mod api;
pub mod backends;
pub mod engine;
pub mod fallback;
pub mod metrics;
pub mod registry;

pub use api::*;
pub use backends::*;
pub use engine::*;
pub use fallback::*;
pub use metrics::*;
pub use registry::*;
