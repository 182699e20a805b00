// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference counted mesh cache shared by the narrowphase workers.
//!
//! Every scheduled use of a mesh retains its slot before the run starts.
//! Raw buffers are read from storage up front, in schedule order. Workers
//! promote them to project-space triangles and a BVH on first acquire and
//! release the slot when done; the slot is evicted when its count reaches
//! zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use clash_geom::broad::bvh::Bvh;
use clash_geom::{Matrix, Triangle, Vector3};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::{DatabaseError, DatabaseHandler, MeshBuffers};
use crate::error::{ClashError, Result};
use crate::model::Container;
use crate::scene::SetGraph;

/// Mesh geometry in project space, ready for narrowphase queries.
#[derive(Debug)]
pub struct ResidentMesh {
    /// Triangles in project millimetres.
    pub triangles: Vec<Triangle>,
    /// BVH over `triangles`.
    pub bvh: Bvh,
}

impl ResidentMesh {
    fn promote(buffers: &MeshBuffers, matrix: &Matrix) -> Self {
        let vertices: Vec<Vector3> = buffers
            .vertices
            .iter()
            .map(|v| matrix.transform_point(&Vector3::from_f32(*v)))
            .collect();
        // Faces were checked on load.
        let triangles: Vec<Triangle> = buffers
            .faces
            .iter()
            .map(|f| {
                Triangle::new(
                    vertices[f[0] as usize],
                    vertices[f[1] as usize],
                    vertices[f[2] as usize],
                )
            })
            .collect();
        let bvh = Bvh::from_triangles(&triangles);
        Self { triangles, bvh }
    }
}

#[derive(Debug)]
struct Slot {
    container: Container,
    unique_id: Uuid,
    matrix: Matrix,
    refs: AtomicUsize,
    buffers: Mutex<Option<Arc<MeshBuffers>>>,
    resident: Mutex<Option<Arc<ResidentMesh>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The node cache. Slots are dense indices handed out by
/// [`NodeCache::register`].
#[derive(Debug, Default)]
pub struct NodeCache {
    slots: Vec<Slot>,
    index: FxHashMap<(Container, Uuid), usize>,
    evictions: AtomicUsize,
}

impl NodeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the nodes of `graph` and returns their slots, one per node
    /// in node order. A node already registered keeps its slot.
    pub fn register(&mut self, graph: &SetGraph) -> Vec<usize> {
        graph
            .nodes()
            .iter()
            .map(|node| {
                let key = (node.container.clone(), node.unique_id);
                if let Some(&slot) = self.index.get(&key) {
                    return slot;
                }
                let slot = self.slots.len();
                self.slots.push(Slot {
                    container: node.container.clone(),
                    unique_id: node.unique_id,
                    matrix: node.matrix,
                    refs: AtomicUsize::new(0),
                    buffers: Mutex::new(None),
                    resident: Mutex::new(None),
                });
                self.index.insert(key, slot);
                slot
            })
            .collect()
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds one pending use of `slot`.
    pub fn retain(&self, slot: usize) {
        self.slots[slot].refs.fetch_add(1, Ordering::AcqRel);
    }

    /// Current reference count of `slot`.
    pub fn refs(&self, slot: usize) -> usize {
        self.slots[slot].refs.load(Ordering::Acquire)
    }

    /// Number of evictions so far.
    pub fn evictions(&self) -> usize {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Returns `true` if `slot` holds promoted geometry.
    pub fn is_resident(&self, slot: usize) -> bool {
        lock(&self.slots[slot].resident).is_some()
    }

    /// Reads the buffers of every retained slot, `order` first and then the
    /// remaining retained slots by index.
    ///
    /// Faces are checked here so workers never see a malformed mesh.
    #[instrument(skip_all, fields(slots = self.slots.len()))]
    pub fn load(
        &self,
        handler: &dyn DatabaseHandler,
        order: impl IntoIterator<Item = usize>,
    ) -> Result<()> {
        let mut loaded = 0_usize;
        let rest = 0..self.slots.len();
        for slot in order.into_iter().chain(rest) {
            let entry = &self.slots[slot];
            if entry.refs.load(Ordering::Acquire) == 0 {
                continue;
            }
            let mut buffers = lock(&entry.buffers);
            if buffers.is_some() {
                continue;
            }
            let data = handler.load_buffers(&entry.container, entry.unique_id)?;
            Self::check_faces(entry, &data)?;
            *buffers = Some(Arc::new(data));
            loaded += 1;
        }
        debug!(loaded, "mesh buffers loaded");
        Ok(())
    }

    fn check_faces(entry: &Slot, data: &MeshBuffers) -> Result<()> {
        for face in &data.faces {
            if face.len() != 3 {
                return Err(ClashError::UnsupportedFace {
                    container: entry.container.clone(),
                    unique_id: entry.unique_id,
                    sides: face.len(),
                });
            }
            if let Some(bad) = face.iter().find(|&&i| i as usize >= data.vertices.len()) {
                return Err(DatabaseError::Corrupt {
                    container: entry.container.clone(),
                    reason: format!(
                        "mesh {} references vertex {bad} of {}",
                        entry.unique_id,
                        data.vertices.len()
                    ),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Returns the project-space geometry of `slot`, promoting the loaded
    /// buffers on first use.
    pub fn acquire(&self, slot: usize) -> Result<Arc<ResidentMesh>> {
        let entry = &self.slots[slot];
        let mut resident = lock(&entry.resident);
        if let Some(mesh) = resident.as_ref() {
            return Ok(Arc::clone(mesh));
        }
        let Some(buffers) = lock(&entry.buffers).clone() else {
            return Err(DatabaseError::BuffersNotFound {
                container: entry.container.clone(),
                unique_id: entry.unique_id,
            }
            .into());
        };
        let mesh = Arc::new(ResidentMesh::promote(&buffers, &entry.matrix));
        *resident = Some(Arc::clone(&mesh));
        Ok(mesh)
    }

    /// Drops one use of `slot`. Returns `true` when this was the last use
    /// and the slot's geometry was evicted.
    pub fn release(&self, slot: usize) -> bool {
        let entry = &self.slots[slot];
        let previous = entry
            .refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        if previous != Ok(1) {
            return false;
        }
        lock(&entry.resident).take();
        lock(&entry.buffers).take();
        self.evictions.fetch_add(1, Ordering::Relaxed);
        debug!(container = %entry.container, unique_id = %entry.unique_id, "mesh evicted");
        true
    }
}
