// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU-visible buffer and texture allocation.

use std::collections::HashMap;

use crate::resource::{
    BufferId, BufferView, ResourceId, StorageMode, TextureDescriptor, TextureFormat, TextureProxy,
    TextureUsage,
};
use crate::{Error, Result};

/// Minimum byte size of any arena buffer.
const MIN_ARENA_SIZE: usize = 1024 * 32;

/// Limits imposed by the device the submission backend will bind against.
///
/// Requests beyond these limits fail the way a driver returning null would.
#[derive(Clone, Copy, Debug)]
pub struct DeviceLimits {
    pub max_buffer_size: usize,
    pub max_texture_extent: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 256 << 20,
            max_texture_extent: 16384,
        }
    }
}

/// One persistent mesh allocation: a vertex view and an index view in the
/// same underlying buffer.
#[derive(Clone, Copy, Debug)]
pub struct PersistentAllocation {
    pub id: u64,
    pub position: BufferView,
    pub index: BufferView,
    pub vertex_bytes: usize,
    pub index_bytes: usize,
}

/// A texture upload queued for the submission backend.
#[derive(Debug)]
pub struct TextureUpload {
    pub texture: TextureProxy,
    pub bytes: Vec<u8>,
}

/// CPU-shared storage standing in for one GPU buffer allocation.
///
/// Stored as `u64` words so byte views carved out of it satisfy the
/// alignment of any vertex or index type they are cast to.
#[derive(Debug)]
struct GpuBuffer {
    id: ResourceId,
    size: usize,
    storage: Vec<u64>,
}

impl GpuBuffer {
    fn new(size: usize) -> Self {
        Self {
            id: ResourceId::next(),
            size,
            storage: vec![0; size.div_ceil(8)],
        }
    }

    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice(&self.storage)[..self.size]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut(&mut self.storage)[..self.size]
    }
}

/// Metadata for one buffer in the persistent arena.
#[derive(Debug)]
struct PersistentBuffer {
    buffer: BufferId,
    offset: usize,
    size: usize,
}

/// Owns every GPU-visible allocation the renderer makes.
///
/// Two arena families: a persistent first-fit arena for mesh data that
/// lives as long as the host buffer, and a triple-buffered transient arena
/// for per-frame data, so up to three frames can be in flight without the
/// CPU stalling on the GPU. Also the registry for textures and the memoized
/// MSAA attachments.
///
/// Persistent allocations are never freed; the arena only grows.
pub struct HostBuffer {
    limits: DeviceLimits,
    buffers: Vec<GpuBuffer>,

    // Persistent arena.
    next_allocation_id: u64,
    persistent: Vec<PersistentBuffer>,
    allocations: HashMap<u64, PersistentAllocation>,

    // Transient arena.
    transient: [Vec<BufferId>; 3],
    current_index: usize,
    current_offset: usize,
    current_buffer: usize,

    // Textures.
    next_texture_id: u64,
    textures: HashMap<u64, TextureProxy>,
    uploads: Vec<TextureUpload>,
    msaa_cache: HashMap<u64, (TextureProxy, TextureProxy)>,
}

impl Default for HostBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBuffer {
    pub fn new() -> Self {
        Self::with_limits(DeviceLimits::default())
    }

    pub fn with_limits(limits: DeviceLimits) -> Self {
        let mut host_buffer = Self {
            limits,
            buffers: Vec::new(),
            next_allocation_id: 0,
            persistent: Vec::new(),
            allocations: HashMap::new(),
            transient: [Vec::new(), Vec::new(), Vec::new()],
            current_index: 0,
            current_offset: 0,
            current_buffer: 0,
            next_texture_id: 0,
            textures: HashMap::new(),
            uploads: Vec::new(),
            msaa_cache: HashMap::new(),
        };
        // Seed each transient slot with one buffer; MIN_ARENA_SIZE is
        // always within limits.
        for slot in 0..3 {
            let buffer = host_buffer.create_buffer(MIN_ARENA_SIZE).expect("minimum arena fits");
            host_buffer.transient[slot].push(buffer);
        }
        host_buffer
    }

    // --- Persistent arena. ---

    /// Allocate room for `vertex_bytes` of vertex data followed by
    /// `index_bytes` of index data, both aligned to `alignment`, from the
    /// first persistent buffer with space (appending a new one when none
    /// fits).
    pub fn allocate_persistent(
        &mut self,
        vertex_bytes: usize,
        index_bytes: usize,
        alignment: usize,
    ) -> Result<PersistentAllocation> {
        // Buffer cursors stay aligned, so only the gap between the vertex
        // and index regions needs padding.
        let vertex_pad = align_to(vertex_bytes, alignment);
        let required = vertex_bytes + vertex_pad + index_bytes;

        let candidate = match self.find_persistent_storage(required) {
            Some(index) => index,
            None => {
                let size = MIN_ARENA_SIZE.max(required);
                let buffer = self.create_buffer(size)?;
                self.persistent.push(PersistentBuffer {
                    buffer,
                    offset: 0,
                    size,
                });
                self.persistent.len() - 1
            }
        };
        let metadata = &mut self.persistent[candidate];

        let position = BufferView {
            buffer: metadata.buffer,
            offset: metadata.offset,
        };
        metadata.offset += vertex_bytes + vertex_pad;
        let index = BufferView {
            buffer: metadata.buffer,
            offset: metadata.offset,
        };
        metadata.offset += index_bytes;
        // Re-align the cursor for the next allocation. This can push the
        // offset past the buffer size; at that point the buffer is full and
        // never selected again, so it is harmless.
        metadata.offset += align_to(metadata.offset, alignment);

        let allocation = PersistentAllocation {
            id: self.next_allocation_id,
            position,
            index,
            vertex_bytes,
            index_bytes,
        };
        self.next_allocation_id += 1;
        self.allocations.insert(allocation.id, allocation);
        Ok(allocation)
    }

    /// Look up a previous persistent allocation by id.
    pub fn lookup_persistent(&self, id: u64) -> Option<PersistentAllocation> {
        self.allocations.get(&id).copied()
    }

    fn find_persistent_storage(&self, required: usize) -> Option<usize> {
        self.persistent
            .iter()
            .position(|d| d.offset < d.size && d.size - d.offset >= required)
    }

    // --- Transient arena. ---

    /// Carve `bytes` (pre-aligned to `alignment`) out of the current
    /// transient slot, rolling to the slot's next buffer when the current
    /// one is full and appending a new buffer when all are.
    pub fn transient_arena(&mut self, bytes: usize, alignment: usize) -> Result<BufferView> {
        let mut padding = align_to(self.current_offset, alignment);
        while self.current_offset + padding + bytes > self.current_transient_size() {
            self.roll_transient_buffer(bytes)?;
            padding = 0;
        }
        self.current_offset += padding;
        let offset = self.current_offset;
        self.current_offset += bytes;
        Ok(BufferView {
            buffer: self.transient[self.current_index][self.current_buffer],
            offset,
        })
    }

    /// Advance to the next transient slot. The submission backend calls
    /// this exactly once per frame boundary, after fencing the slot being
    /// reused.
    pub fn increment_transient_buffer(&mut self) {
        self.current_index = (self.current_index + 1) % 3;
        self.current_offset = 0;
        self.current_buffer = 0;
    }

    fn current_transient_size(&self) -> usize {
        let id = self.transient[self.current_index][self.current_buffer];
        self.buffers[id.0].size
    }

    fn roll_transient_buffer(&mut self, required: usize) -> Result<()> {
        self.current_buffer += 1;
        self.current_offset = 0;
        if self.current_buffer < self.transient[self.current_index].len() {
            return Ok(());
        }
        let buffer = self.create_buffer(MIN_ARENA_SIZE.max(required))?;
        self.transient[self.current_index].push(buffer);
        Ok(())
    }

    // --- Buffer contents. ---

    /// Total number of buffers allocated, across both arenas.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// The process-unique resource id of a buffer, for backend binding
    /// tables.
    pub fn buffer_resource_id(&self, id: BufferId) -> ResourceId {
        self.buffers[id.0].id
    }

    /// Byte size of a buffer.
    pub fn buffer_size(&self, id: BufferId) -> usize {
        self.buffers[id.0].size
    }

    /// The full contents of a buffer, for backend upload.
    pub fn buffer_bytes(&self, id: BufferId) -> &[u8] {
        self.buffers[id.0].bytes()
    }

    /// A writable window of `len` bytes behind `view`.
    pub fn contents_mut(&mut self, view: BufferView, len: usize) -> &mut [u8] {
        &mut self.buffers[view.buffer.0].bytes_mut()[view.offset..view.offset + len]
    }

    /// Writable windows for both halves of a persistent mesh allocation.
    ///
    /// The vertex and index views of one allocation always share a buffer
    /// with the index region strictly after the vertex region, which is
    /// what makes the split borrow possible.
    pub fn mesh_contents_mut(
        &mut self,
        allocation: &PersistentAllocation,
    ) -> (&mut [u8], &mut [u8]) {
        debug_assert_eq!(allocation.position.buffer, allocation.index.buffer);
        let bytes = self.buffers[allocation.position.buffer.0].bytes_mut();
        let (head, tail) = bytes.split_at_mut(allocation.index.offset);
        (
            &mut head[allocation.position.offset..allocation.position.offset + allocation.vertex_bytes],
            &mut tail[..allocation.index_bytes],
        )
    }

    fn create_buffer(&mut self, size: usize) -> Result<BufferId> {
        if size > self.limits.max_buffer_size {
            return Err(Error::BufferAllocation {
                requested: size,
                limit: self.limits.max_buffer_size,
            });
        }
        let id = BufferId(self.buffers.len());
        self.buffers.push(GpuBuffer::new(size));
        Ok(id)
    }

    // --- Textures. ---

    /// Create a texture and register it; the returned id is monotonically
    /// increasing and can be resolved again with [`texture`](Self::texture).
    pub fn allocate_texture(&mut self, desc: &TextureDescriptor) -> Result<(TextureProxy, u64)> {
        let proxy = self.allocate_temp_texture(desc)?;
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        self.textures.insert(id, proxy);
        Ok((proxy, id))
    }

    /// Create a texture without registering it.
    pub fn allocate_temp_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureProxy> {
        let limit = self.limits.max_texture_extent;
        if desc.width > limit || desc.height > limit || desc.width == 0 || desc.height == 0 {
            return Err(Error::TextureAllocation {
                width: desc.width,
                height: desc.height,
                limit,
            });
        }
        Ok(TextureProxy::new(desc))
    }

    /// Resolve a registered texture id.
    pub fn texture(&self, id: u64) -> Option<TextureProxy> {
        self.textures.get(&id).copied()
    }

    /// Queue texel data for the backend to upload into `texture`.
    pub fn write_texture(&mut self, texture: TextureProxy, bytes: Vec<u8>) {
        self.uploads.push(TextureUpload { texture, bytes });
    }

    /// Drain the queued texture uploads.
    pub fn take_texture_uploads(&mut self) -> Vec<TextureUpload> {
        std::mem::take(&mut self.uploads)
    }

    /// The memoized multisampled color and depth-stencil attachments for a
    /// target of the given dimensions.
    pub fn msaa_textures(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<(TextureProxy, TextureProxy)> {
        let cache_key = (u64::from(width) << 32) | u64::from(height);
        if let Some(&pair) = self.msaa_cache.get(&cache_key) {
            return Ok(pair);
        }
        let color = self.allocate_temp_texture(&TextureDescriptor {
            width,
            height,
            format: TextureFormat::Bgra8Unorm,
            usage: TextureUsage::RENDER_TARGET,
            storage_mode: StorageMode::Memoryless,
            sample_count: 4,
            lossy_compression: false,
        })?;
        let depth_stencil = self.allocate_temp_texture(&TextureDescriptor {
            width,
            height,
            format: TextureFormat::Depth32FloatStencil8,
            usage: TextureUsage::RENDER_TARGET,
            storage_mode: StorageMode::Memoryless,
            sample_count: 4,
            lossy_compression: false,
        })?;
        self.msaa_cache.insert(cache_key, (color, depth_stencil));
        Ok((color, depth_stencil))
    }
}

/// The padding needed to bring `offset_bytes` up to a multiple of
/// `alignment_bytes`.
fn align_to(offset_bytes: usize, alignment_bytes: usize) -> usize {
    let rem = offset_bytes % alignment_bytes;
    if rem > 0 {
        alignment_bytes - rem
    } else {
        0
    }
}
