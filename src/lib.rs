// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fresco is the core of a retained-mode 2D vector graphics renderer: it
//! turns drawing calls (paths, rectangles, clips, textured quads, layers
//! with filters) into a self-contained, ordered list of draw records for a
//! GPU rasterizer with depth and stencil attachments.
//!
//! The pipeline is made of four cooperating pieces:
//!
//! - [`Path`] / [`PathBuilder`]: a typed segment stream with precomputed
//!   bounds and a convexity flag (see [`Convexicator`]).
//! - [`Tessellator`]: converts paths into triangle meshes, centroid-fan
//!   fills and extruded-quad strokes, using Wang's-formula subdivision
//!   ([`wangs_formula`]) and internal growable arenas.
//! - [`HostBuffer`]: packs meshes into GPU-visible buffers across a
//!   persistent first-fit arena and a triple-buffered per-frame arena, and
//!   registers textures.
//! - [`Canvas`]: records commands against transform/clip/layer stacks,
//!   reorders opaque draws ahead of blended ones for depth-based occlusion
//!   culling, back-patches clip depth fences, and finalizes everything into
//!   a [`RenderProgram`].
//!
//! A submission backend walks the [`RenderProgram`], rendering offscreens
//! first (innermost to outermost) and then the onscreen commands, and
//! issues the actual GPU work. The core produces structured data only; it
//! never touches a device. GPU resources appear as `Copy` proxy handles
//! ([`TextureProxy`], [`BufferView`]) that the backend late-binds.
//!
//! ```
//! use fresco::{Canvas, Color, HostBuffer, Paint, Rect, Tessellator};
//!
//! let mut host_buffer = HostBuffer::new();
//! let mut tessellator = Tessellator::new();
//! let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
//! canvas.draw_rect(&Rect::from_ltrb(10.0, 10.0, 90.0, 90.0), Paint::from_color(Color::RED));
//! let program = canvas.prepare();
//! assert_eq!(program.commands().len(), 1);
//! ```
//!
//! The whole crate is single-threaded: a canvas, host buffer and
//! tessellator belong to one driver thread. The transient arena's triple
//! buffering is the only concurrency-coupled mechanism (slot `i` may be in
//! flight on the GPU while the CPU fills slot `(i + 1) % 3`) and the
//! backend owns the fencing for it.

#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]

mod canvas;
mod convexicator;
mod geometry;
mod host_buffer;
mod paint;
mod path;
mod resource;
mod tessellator;
pub mod wangs_formula;

pub use canvas::{Canvas, Command, CommandType, Offscreen, RenderProgram};
pub use convexicator::{Convexicator, Direction};
pub use geometry::{Color, Matrix, Point, Rect, Size};
pub use host_buffer::{DeviceLimits, HostBuffer, PersistentAllocation, TextureUpload};
pub use paint::{ClipStyle, ColorFilter, Gradient, ImageFilter, Paint};
pub use path::{Path, PathBuilder, Segment, SegmentType};
pub use resource::{
    BufferId, BufferView, ResourceId, StorageMode, TextureDescriptor, TextureFormat, TextureProxy,
    TextureUsage,
};
pub use tessellator::Tessellator;

use thiserror::Error;

/// Errors that can occur in Fresco.
///
/// The core runs over trusted in-process inputs, so the only runtime
/// failures are resource requests the device cannot satisfy. Drawing calls
/// swallow these (dropping the command and logging a warning); explicit
/// resource calls surface them.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A GPU buffer request was larger than the device allows.
    #[error("buffer allocation of {requested} bytes exceeds the device limit of {limit}")]
    BufferAllocation { requested: usize, limit: usize },
    /// A texture request had a zero or over-limit extent.
    #[error("texture extent {width}x{height} exceeds the device limit of {limit}")]
    TextureAllocation { width: u32, height: u32, limit: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
