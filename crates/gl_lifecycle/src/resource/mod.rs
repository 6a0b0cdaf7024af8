//! GPU-resident resources and the registry that tracks them
//!
//! Every resource is created while some context is current and records that
//! context as its owner. From then on any operation that reaches the GPU is
//! only legal while the owner is current again; the registry checks this
//! before handing out mutable access, so a wrong-context call never makes a
//! native call.
//!
//! Deleting a resource releases its native names and removes it from the
//! registry. [`ResourceRegistry::delete_all`] does the same for every live
//! resource at teardown, switching to each owning context exactly once.

pub mod shader;
pub mod texture;
pub mod vertex_array;

use std::fmt;

use slotmap::SlotMap;

use crate::backend::{GpuApi, Platform};
use crate::context::ContextManager;
use crate::error::{GfxError, GfxResult};
use crate::foundation::collections::{ResourceId, TypedHandle, WindowId};

pub use shader::{ShaderProgram, ShaderStage};
pub use texture::{ResizeFilter, Texture, TextureOptions, TextureSlot, WrapMode};
pub use vertex_array::{VertexArray, VertexArrayObject};

/// Kind of a GPU resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// 2D texture
    Texture,
    /// Linked shader program
    ShaderProgram,
    /// Vertex-array object with its buffers
    VertexArray,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Texture => "Texture",
            Self::ShaderProgram => "Shader program",
            Self::VertexArray => "Vertex array object",
        })
    }
}

/// Closed set of resources the registry can own
#[derive(Debug, PartialEq, Eq)]
pub enum Resource {
    /// See [`Texture`]
    Texture(Texture),
    /// See [`ShaderProgram`]
    Shader(ShaderProgram),
    /// See [`VertexArrayObject`]
    VertexArray(VertexArrayObject),
}

impl Resource {
    /// Kind of the wrapped resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Texture(_) => ResourceKind::Texture,
            Self::Shader(_) => ResourceKind::ShaderProgram,
            Self::VertexArray(_) => ResourceKind::VertexArray,
        }
    }

    /// Release every native name; the owner must be current
    pub(crate) fn release<G: GpuApi>(&mut self, gpu: &mut G) {
        match self {
            Self::Texture(texture) => texture.release(gpu),
            Self::Shader(program) => program.release(gpu),
            Self::VertexArray(vao) => vao.release(gpu),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Typed view into [`Resource`], implemented for each variant
pub trait GpuResource: sealed::Sealed + Sized {
    /// Kind reported in errors
    const KIND: ResourceKind;

    /// Borrow the variant if it matches
    fn from_resource(resource: &Resource) -> Option<&Self>;

    /// Mutably borrow the variant if it matches
    fn from_resource_mut(resource: &mut Resource) -> Option<&mut Self>;

    /// Wrap into the closed enum
    fn into_resource(self) -> Resource;
}

macro_rules! impl_gpu_resource {
    ($ty:ty, $variant:ident, $kind:expr) => {
        impl sealed::Sealed for $ty {}

        impl GpuResource for $ty {
            const KIND: ResourceKind = $kind;

            fn from_resource(resource: &Resource) -> Option<&Self> {
                match resource {
                    Resource::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_resource_mut(resource: &mut Resource) -> Option<&mut Self> {
                match resource {
                    Resource::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn into_resource(self) -> Resource {
                Resource::$variant(self)
            }
        }
    };
}

impl_gpu_resource!(Texture, Texture, ResourceKind::Texture);
impl_gpu_resource!(ShaderProgram, Shader, ResourceKind::ShaderProgram);
impl_gpu_resource!(VertexArrayObject, VertexArray, ResourceKind::VertexArray);

/// Handle to a registered [`Texture`]
pub type TextureHandle = TypedHandle<Texture>;
/// Handle to a registered [`ShaderProgram`]
pub type ShaderHandle = TypedHandle<ShaderProgram>;
/// Handle to a registered [`VertexArrayObject`]
pub type VertexArrayHandle = TypedHandle<VertexArrayObject>;

#[derive(Debug)]
struct Entry {
    owner: WindowId,
    resource: Resource,
}

/// Ordered set of live resources and their owning contexts
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: SlotMap<ResourceId, Entry>,
    order: Vec<ResourceId>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `resource` as owned by `owner`
    pub fn register<T: GpuResource>(&mut self, owner: WindowId, resource: T) -> TypedHandle<T> {
        let id = self.entries.insert(Entry {
            owner,
            resource: resource.into_resource(),
        });
        self.order.push(id);
        log::trace!("Registered {} {:?} owned by {:?}", T::KIND, id, owner);
        TypedHandle::new(id)
    }

    /// Stop tracking a resource without releasing its native names
    ///
    /// The caller takes over responsibility for the returned resource.
    pub fn unregister(&mut self, id: ResourceId) -> Option<Resource> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|other| *other != id);
        log::trace!("Unregistered {} {:?}", entry.resource.kind(), id);
        Some(entry.resource)
    }

    /// Whether `id` refers to a live resource
    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether `id` was deleted (or unregistered)
    pub fn is_deleted(&self, id: ResourceId) -> bool {
        !self.contains(id)
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no resource is live
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live resources in registration order
    pub fn live_ids(&self) -> &[ResourceId] {
        &self.order
    }

    /// Owning context of a live resource
    pub fn owner(&self, id: ResourceId) -> Option<WindowId> {
        self.entries.get(id).map(|entry| entry.owner)
    }

    /// Kind of a live resource
    pub fn kind(&self, id: ResourceId) -> Option<ResourceKind> {
        self.entries.get(id).map(|entry| entry.resource.kind())
    }

    /// Number of live resources owned by `owner`
    pub fn owned_by(&self, owner: WindowId) -> usize {
        self.entries.values().filter(|entry| entry.owner == owner).count()
    }

    /// Read-only access, valid regardless of the current context
    ///
    /// Only CPU-side state is reachable through a shared reference.
    pub fn get<T: GpuResource>(&self, handle: TypedHandle<T>) -> GfxResult<&T> {
        self.entries
            .get(handle.key())
            .and_then(|entry| T::from_resource(&entry.resource))
            .ok_or(GfxError::ResourceDeleted { kind: T::KIND })
    }

    /// Mutable access for an operation that reaches the GPU
    ///
    /// Fails if the resource was deleted, if its owner was destroyed, or if the
    /// owner is not the current context.
    pub fn get_checked_mut<T: GpuResource>(
        &mut self,
        handle: TypedHandle<T>,
        contexts: &ContextManager,
    ) -> GfxResult<&mut T> {
        let entry = self
            .entries
            .get_mut(handle.key())
            .ok_or(GfxError::ResourceDeleted { kind: T::KIND })?;
        check_owner(entry.owner, T::KIND, contexts)?;
        T::from_resource_mut(&mut entry.resource).ok_or(GfxError::ResourceDeleted { kind: T::KIND })
    }

    /// Release a resource's native names and unregister it
    pub fn delete<T: GpuResource, G: GpuApi>(
        &mut self,
        handle: TypedHandle<T>,
        contexts: &ContextManager,
        gpu: &mut G,
    ) -> GfxResult<()> {
        self.get_checked_mut(handle, contexts)?;
        self.release(handle.key(), gpu);
        Ok(())
    }

    /// Delete every live resource
    ///
    /// Resources are grouped by owner in registration order of each group's
    /// first member. Each owner is made current once and all of its resources
    /// are released under it. An owner whose context cannot be made current is
    /// skipped and its resources stay registered; the remaining owners are
    /// still torn down and the first failure is returned afterwards.
    ///
    /// Returns how many resources were deleted. The last owner processed stays
    /// current.
    pub fn delete_all<P: Platform, G: GpuApi>(
        &mut self,
        contexts: &mut ContextManager,
        platform: &mut P,
        gpu: &mut G,
    ) -> GfxResult<usize> {
        let mut owners: Vec<WindowId> = Vec::new();
        for id in &self.order {
            let owner = self.entries[*id].owner;
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }

        let mut deleted = 0;
        let mut first_error = None;
        for owner in owners {
            let group: Vec<ResourceId> = self
                .order
                .iter()
                .copied()
                .filter(|id| self.entries[*id].owner == owner)
                .collect();

            let Some(&first) = group.first() else {
                continue;
            };
            if let Err(source) = contexts.make_current(platform, owner) {
                let kind = self.entries[first].resource.kind();
                log::warn!(
                    "Context {:?} is gone, {} resource(s) it owned cannot be deleted",
                    owner,
                    group.len()
                );
                first_error.get_or_insert(GfxError::TeardownContextLost {
                    kind,
                    source: Box::new(source),
                });
                continue;
            }

            for id in group {
                self.release(id, gpu);
                deleted += 1;
            }
        }

        if deleted > 0 {
            log::debug!("Deleted {} resource(s) at teardown", deleted);
        }
        first_error.map_or(Ok(deleted), Err)
    }

    /// Forget every remaining resource without touching the GPU
    ///
    /// Only meaningful once their contexts are gone and the driver has
    /// reclaimed the names with them.
    pub(crate) fn abandon_all(&mut self) -> usize {
        let abandoned = self.order.len();
        for id in self.order.drain(..) {
            if let Some(entry) = self.entries.remove(id) {
                log::warn!("Abandoned {} {:?} of destroyed context {:?}", entry.resource.kind(), id, entry.owner);
            }
        }
        abandoned
    }

    fn release<G: GpuApi>(&mut self, id: ResourceId, gpu: &mut G) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.resource.release(gpu);
        }
        self.unregister(id);
    }
}

fn check_owner(owner: WindowId, kind: ResourceKind, contexts: &ContextManager) -> GfxResult<()> {
    if !contexts.is_live(owner) {
        return Err(GfxError::OwnerContextDestroyed { kind });
    }
    if !contexts.is_current(owner) {
        return Err(GfxError::WrongContextActive {
            owner,
            current: contexts.current_context(),
        });
    }
    Ok(())
}
