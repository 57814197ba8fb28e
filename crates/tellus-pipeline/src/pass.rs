//! The four-stage pass orchestrator.
//!
//! One pass per external trigger (typically one per rendered frame):
//! subdivide (parallel per source triangle) → merge vertices
//! (single-threaded replay in partition order) → scatter attributes and
//! per-partition index triples (parallel) → flatten index streams into
//! one contiguous buffer (parallel, atomic cursors). Every stage is fully
//! barriered before the next starts; the orchestrator polls completion
//! once per tick so the host application stays responsive while a pass is
//! in flight across several ticks.

use std::sync::{Arc, OnceLock};

use glam::{Vec3, Vec4};
use tellus_mesh::{MeshBuffers, Triangle, VertexKey, VertexTable};
use tellus_subdivide::{SubdivisionParams, subdivide};

use crate::cursor::WriteCursors;
use crate::error::PipelineError;
use crate::frustum::CullingParams;
use crate::pool::{StageHandle, WorkerPool};
use crate::scatter::ScatterBuffer;
use crate::stream::StreamSet;

/// Parameters for one subdivision pass.
#[derive(Clone, Debug)]
pub struct PassParams {
    /// The point detail concentrates toward (camera or cursor).
    pub target: Vec3,
    /// Depth and range of the subdivision falloff.
    pub subdivision: SubdivisionParams,
    /// Optional frustum pre-filter; culled triangles pass through
    /// unchanged.
    pub culling: Option<CullingParams>,
}

/// Result of polling the pipeline.
#[derive(Debug)]
pub enum PassStatus {
    /// No pass is running.
    Idle,
    /// A pass is running; poll again next tick.
    InFlight,
    /// The pass finished this tick; the rebuilt mesh is ready for upload.
    Complete(MeshBuffers),
}

enum PassState {
    Idle,
    Subdividing {
        handle: StageHandle,
        streams: Arc<StreamSet<Triangle>>,
    },
    Merging {
        handle: StageHandle,
        streams: Arc<StreamSet<Triangle>>,
        table: Arc<OnceLock<VertexTable>>,
    },
    Scattering {
        handle: StageHandle,
        positions: Arc<ScatterBuffer<Vec3>>,
        normals: Arc<ScatterBuffer<Vec3>>,
        colors: Arc<ScatterBuffer<Vec4>>,
        index_streams: Arc<StreamSet<u32>>,
    },
    Flattening {
        handle: StageHandle,
        positions: Arc<ScatterBuffer<Vec3>>,
        normals: Arc<ScatterBuffer<Vec3>>,
        colors: Arc<ScatterBuffer<Vec4>>,
        indices: Arc<ScatterBuffer<u32>>,
        // Kept alive until the stage drains; also the reset discipline:
        // every pass arms a fresh set, so stale offsets cannot leak.
        _cursors: Arc<WriteCursors>,
        index_streams: Arc<StreamSet<u32>>,
    },
}

impl PassState {
    fn handle(&self) -> Option<&StageHandle> {
        match self {
            PassState::Idle => None,
            PassState::Subdividing { handle, .. }
            | PassState::Merging { handle, .. }
            | PassState::Scattering { handle, .. }
            | PassState::Flattening { handle, .. } => Some(handle),
        }
    }
}

/// Drives subdivision passes over a shared worker pool.
pub struct SubdivisionPipeline {
    pool: Arc<WorkerPool>,
    state: PassState,
}

impl SubdivisionPipeline {
    /// Create a pipeline over an existing worker pool.
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self {
            pool,
            state: PassState::Idle,
        }
    }

    /// Pipeline with its own default-sized pool.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(WorkerPool::with_defaults()))
    }

    /// Returns `true` while a pass is running.
    pub fn is_in_flight(&self) -> bool {
        !matches!(self.state, PassState::Idle)
    }

    /// Start a pass over `source` toward the params' target point.
    ///
    /// Fails with [`PipelineError::PassInFlight`] if a previous pass has
    /// not drained, and with a mesh error if `source` is malformed.
    pub fn begin(&mut self, source: &MeshBuffers, params: PassParams) -> Result<(), PipelineError> {
        if self.is_in_flight() {
            return Err(PipelineError::PassInFlight);
        }
        source.validate()?;

        let triangle_count = source.triangle_count();
        let mut triangles = Vec::with_capacity(triangle_count);
        for i in 0..triangle_count {
            triangles.push(source.extract_triangle(i)?);
        }
        let triangles = Arc::new(triangles);
        let params = Arc::new(params);
        let streams = Arc::new(StreamSet::new(triangle_count));

        let streams_task = Arc::clone(&streams);
        let handle = self.pool.fork(triangle_count, move |i| {
            let tri = &triangles[i];
            // SAFETY: task `i` is the sole writer of partition `i` for
            // the duration of this stage.
            let stream = unsafe { streams_task.partition_mut(i) };

            if let Some(cull) = &params.culling
                && cull.frustum.triangle_outside(
                    &cull.world,
                    &tri.positions,
                    cull.camera,
                    cull.near_override,
                )
            {
                stream.push(*tri);
                return;
            }

            let distances = [
                params.subdivision.normalized_distance(tri.positions[0], params.target),
                params.subdivision.normalized_distance(tri.positions[1], params.target),
                params.subdivision.normalized_distance(tri.positions[2], params.target),
            ];
            subdivide(tri, 0, distances, params.subdivision.max_level, stream);
        });

        log::debug!("subdivision pass started over {triangle_count} source triangles");
        self.state = PassState::Subdividing { handle, streams };
        Ok(())
    }

    /// Advance the pass. Call once per external tick.
    ///
    /// Each completed stage immediately dispatches the next; an
    /// unfinished stage returns [`PassStatus::InFlight`] without
    /// blocking.
    pub fn poll(&mut self) -> PassStatus {
        loop {
            match std::mem::replace(&mut self.state, PassState::Idle) {
                PassState::Idle => return PassStatus::Idle,

                PassState::Subdividing { handle, streams } => {
                    if !handle.is_complete() {
                        self.state = PassState::Subdividing { handle, streams };
                        return PassStatus::InFlight;
                    }
                    self.state = self.start_merge(streams);
                }

                PassState::Merging {
                    handle,
                    streams,
                    table,
                } => {
                    if !handle.is_complete() {
                        self.state = PassState::Merging {
                            handle,
                            streams,
                            table,
                        };
                        return PassStatus::InFlight;
                    }
                    self.state = self.start_scatter(streams, table);
                }

                PassState::Scattering {
                    handle,
                    positions,
                    normals,
                    colors,
                    index_streams,
                } => {
                    if !handle.is_complete() {
                        self.state = PassState::Scattering {
                            handle,
                            positions,
                            normals,
                            colors,
                            index_streams,
                        };
                        return PassStatus::InFlight;
                    }
                    self.state = self.start_flatten(positions, normals, colors, index_streams);
                }

                PassState::Flattening {
                    handle,
                    positions,
                    normals,
                    colors,
                    indices,
                    _cursors,
                    index_streams,
                } => {
                    if !handle.is_complete() {
                        self.state = PassState::Flattening {
                            handle,
                            positions,
                            normals,
                            colors,
                            indices,
                            _cursors,
                            index_streams,
                        };
                        return PassStatus::InFlight;
                    }

                    let output = MeshBuffers {
                        positions: positions.snapshot(),
                        normals: normals.snapshot(),
                        colors: colors.snapshot(),
                        indices: indices.snapshot(),
                    };
                    log::debug!(
                        "subdivision pass complete: {} triangles, {} vertices",
                        output.triangle_count(),
                        output.vertex_count()
                    );
                    return PassStatus::Complete(output);
                }
            }
        }
    }

    /// Block until the current pass finishes, returning its output.
    ///
    /// Returns `None` if no pass was in flight. Single-shot callers and
    /// tests use this; frame-driven hosts poll instead.
    pub fn run_to_completion(&mut self) -> Option<MeshBuffers> {
        loop {
            match self.poll() {
                PassStatus::Idle => return None,
                PassStatus::Complete(mesh) => return Some(mesh),
                PassStatus::InFlight => {
                    std::thread::sleep(std::time::Duration::from_micros(50));
                }
            }
        }
    }

    /// Stage 2: replay every partition in ascending order into one
    /// position → index table. Runs as a single pool task so the main
    /// thread never blocks on it.
    fn start_merge(&self, streams: Arc<StreamSet<Triangle>>) -> PassState {
        let table = Arc::new(OnceLock::new());
        let streams_task = Arc::clone(&streams);
        let table_task = Arc::clone(&table);

        let handle = self.pool.fork(1, move |_| {
            let mut map = VertexTable::default();
            for partition in 0..streams_task.partition_count() {
                for tri in streams_task.partition(partition) {
                    for &position in &tri.positions {
                        let next = map.len() as u32;
                        map.entry(VertexKey::new(position)).or_insert(next);
                    }
                }
            }
            let _ = table_task.set(map);
        });

        PassState::Merging {
            handle,
            streams,
            table,
        }
    }

    /// Stage 3: resolve final indices through the table, scatter vertex
    /// attributes, and append index triples to per-partition streams.
    fn start_scatter(
        &self,
        streams: Arc<StreamSet<Triangle>>,
        table: Arc<OnceLock<VertexTable>>,
    ) -> PassState {
        let vertex_count = table
            .get()
            .expect("merge stage completed without publishing the vertex table")
            .len();
        let partition_count = streams.partition_count();

        let positions = Arc::new(ScatterBuffer::new(vertex_count, Vec3::ZERO));
        let normals = Arc::new(ScatterBuffer::new(vertex_count, Vec3::ZERO));
        let colors = Arc::new(ScatterBuffer::new(vertex_count, Vec4::ZERO));
        let index_streams = Arc::new(StreamSet::new(partition_count));

        let positions_task = Arc::clone(&positions);
        let normals_task = Arc::clone(&normals);
        let colors_task = Arc::clone(&colors);
        let index_streams_task = Arc::clone(&index_streams);

        let handle = self.pool.fork(partition_count, move |partition| {
            let map = table
                .get()
                .expect("scatter stage started before the merge barrier");
            // SAFETY: task owns partition `partition` of the index
            // streams for this stage.
            let index_stream = unsafe { index_streams_task.partition_mut(partition) };

            for tri in streams.partition(partition) {
                for corner in 0..3 {
                    let index = map[&VertexKey::new(tri.positions[corner])];
                    // SAFETY: concurrent writers targeting the same index
                    // write the attributes of the same deduplicated
                    // vertex, so colliding values are identical.
                    unsafe {
                        positions_task.write(index as usize, tri.positions[corner]);
                        normals_task.write(index as usize, tri.normals[corner]);
                        colors_task.write(index as usize, tri.colors[corner]);
                    }
                    index_stream.push(index);
                }
            }
        });

        PassState::Scattering {
            handle,
            positions,
            normals,
            colors,
            index_streams,
        }
    }

    /// Stage 4: flatten the per-partition index streams into one
    /// contiguous buffer. Each task claims its partition's whole range in
    /// one atomic add, which keeps the per-source-triangle grouping
    /// intact in the output.
    fn start_flatten(
        &self,
        positions: Arc<ScatterBuffer<Vec3>>,
        normals: Arc<ScatterBuffer<Vec3>>,
        colors: Arc<ScatterBuffer<Vec4>>,
        index_streams: Arc<StreamSet<u32>>,
    ) -> PassState {
        let partition_count = index_streams.partition_count();
        let mut offsets = Vec::with_capacity(partition_count);
        let mut total = 0_usize;
        for partition in 0..partition_count {
            offsets.push(total);
            total += index_streams.partition_len(partition);
        }

        let indices = Arc::new(ScatterBuffer::new(total, 0_u32));
        let cursors = Arc::new(WriteCursors::new_unarmed(partition_count));
        cursors.arm(&offsets);

        let indices_task = Arc::clone(&indices);
        let cursors_task = Arc::clone(&cursors);
        let index_streams_task = Arc::clone(&index_streams);

        let handle = self.pool.fork(partition_count, move |partition| {
            let stream = index_streams_task.partition(partition);
            if stream.is_empty() {
                return;
            }
            let base = cursors_task.claim(partition, stream.len());
            for (offset, &index) in stream.iter().enumerate() {
                // SAFETY: [base, base + len) is this task's claimed
                // disjoint range.
                unsafe { indices_task.write(base + offset, index) };
            }
        });

        PassState::Flattening {
            handle,
            positions,
            normals,
            colors,
            indices,
            _cursors: cursors,
            index_streams,
        }
    }
}

impl Drop for SubdivisionPipeline {
    fn drop(&mut self) {
        // An in-flight stage still references the shared buffers; drain
        // it before they are released.
        if let Some(handle) = self.state.handle() {
            handle.wait();
        }
    }
}
