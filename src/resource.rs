// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proxy handles for GPU resources.
//!
//! The core never touches a driver object: buffers and textures are
//! represented by lightweight `Copy` proxies with process-unique ids, and
//! the submission backend late-binds them to real device objects when it
//! walks a [`RenderProgram`](crate::RenderProgram).

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique, monotonically increasing resource identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResourceId(pub NonZeroU64);

impl ResourceId {
    pub fn next() -> Self {
        // Initialized to 1 so the conversion below always succeeds.
        static ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(NonZeroU64::new(ID_COUNTER.fetch_add(1, Ordering::Relaxed)).unwrap())
    }
}

/// Index of a buffer in its owning [`HostBuffer`](crate::HostBuffer).
///
/// Stable for the lifetime of the host buffer; buffers are never freed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BufferId(pub(crate) usize);

impl BufferId {
    /// Position in the host buffer's buffer table.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A non-owning view into a buffer owned by a
/// [`HostBuffer`](crate::HostBuffer).
///
/// The underlying storage lives exactly as long as the host buffer, so a
/// view can be embedded in recorded commands without lifetime plumbing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferView {
    pub buffer: BufferId,
    pub offset: usize,
}

/// Texel formats the core allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Bgra8Unorm,
    Depth32FloatStencil8,
}

/// How a texture may be bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureUsage(u32);

impl TextureUsage {
    pub const NONE: Self = Self(0);
    pub const RENDER_TARGET: Self = Self(1);
    pub const SHADER_READ: Self = Self(1 << 1);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for TextureUsage {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Where a texture's memory lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// CPU-visible, GPU-readable.
    #[default]
    Shared,
    /// Device-local only.
    Private,
    /// Tile memory only; contents do not survive the render pass.
    Memoryless,
}

/// Everything the backend needs to create a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub storage_mode: StorageMode,
    pub sample_count: u32,
    /// Allow the driver to apply lossy framebuffer compression.
    pub lossy_compression: bool,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Bgra8Unorm,
            usage: TextureUsage::SHADER_READ,
            storage_mode: StorageMode::Shared,
            sample_count: 1,
            lossy_compression: false,
        }
    }
}

/// Proxy used as a handle to a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureProxy {
    pub id: ResourceId,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub storage_mode: StorageMode,
    pub sample_count: u32,
    pub lossy_compression: bool,
}

impl TextureProxy {
    pub fn new(desc: &TextureDescriptor) -> Self {
        Self {
            id: ResourceId::next(),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            storage_mode: desc.storage_mode,
            sample_count: desc.sample_count,
            lossy_compression: desc.lossy_compression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_ids_are_unique_and_increasing() {
        let a = ResourceId::next();
        let b = ResourceId::next();
        assert!(b.0.get() > a.0.get());
    }

    #[test]
    fn usage_flags_combine() {
        let usage = TextureUsage::RENDER_TARGET | TextureUsage::SHADER_READ;
        assert!(usage.contains(TextureUsage::RENDER_TARGET));
        assert!(usage.contains(TextureUsage::SHADER_READ));
        assert!(!TextureUsage::SHADER_READ.contains(TextureUsage::RENDER_TARGET));
    }

    #[test]
    fn proxy_copies_descriptor_fields() {
        let desc = TextureDescriptor {
            width: 64,
            height: 32,
            format: TextureFormat::Bgra8Unorm,
            usage: TextureUsage::RENDER_TARGET,
            storage_mode: StorageMode::Private,
            sample_count: 4,
            lossy_compression: true,
        };
        let proxy = TextureProxy::new(&desc);
        assert_eq!(proxy.width, 64);
        assert_eq!(proxy.height, 32);
        assert_eq!(proxy.sample_count, 4);
        assert!(proxy.lossy_compression);
    }
}
