//! Flux Media Model
//!
//! Defines the data contracts shared by the Flux tools:
//! - **Scenes:** Sensitivity presets, detection options, and scene-change records
//! - **Regions:** Integer pixel rectangles used by the pixel filters
//! - **Annotations:** Page annotations and the per-page undo/redo session
//!
//! All timestamps are seconds as `f64`; all pixel coordinates are integer
//! offsets into an RGBA raster with the origin at the top-left.

pub mod annotation;
pub mod region;
pub mod scene;

pub use annotation::*;
pub use region::*;
pub use scene::*;
