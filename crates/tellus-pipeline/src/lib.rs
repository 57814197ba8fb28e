//! Parallelized subdivision pipeline: the same split rule as
//! `tellus-subdivide`, re-expressed as four fork-join stages over a fixed
//! worker pool, with per-partition output streams, a single-threaded
//! vertex merge, scatter-write attribute resolution, and atomic-cursor
//! index flattening.

mod cursor;
mod error;
mod frustum;
mod pass;
mod pool;
mod scatter;
mod stream;

pub use cursor::WriteCursors;
pub use error::PipelineError;
pub use frustum::{CullingParams, Frustum};
pub use pass::{PassParams, PassStatus, SubdivisionPipeline};
pub use pool::{StageHandle, WorkerPool};
pub use scatter::ScatterBuffer;
pub use stream::StreamSet;
