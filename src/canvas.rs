// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command recording: the drawing API, the transform/clip/layer stacks and
//! the occlusion-reordered command lists they produce.

use smallvec::SmallVec;

use crate::geometry::{Color, Matrix, Point, Rect};
use crate::host_buffer::HostBuffer;
use crate::paint::{ClipStyle, ColorFilter, Gradient, ImageFilter, Paint};
use crate::path::Path;
use crate::resource::{
    BufferView, StorageMode, TextureDescriptor, TextureFormat, TextureProxy, TextureUsage,
};
use crate::tessellator::Tessellator;
use crate::Result;

/// Alignment granularity of mesh allocations.
const BUFFER_ALIGNMENT: usize = 16;
const POINT_SIZE: usize = std::mem::size_of::<Point>();
const INDEX_SIZE: usize = std::mem::size_of::<u16>();

/// What a [`Command`] asks the submission backend to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandType {
    /// Rasterize the referenced mesh with the command's paint.
    Draw,
    /// Composite the referenced texture into the command's bounds.
    Texture,
    /// Update the stencil/depth clip state from the referenced mesh.
    Clip,
}

/// One recorded drawing, compositing or clipping action.
#[derive(Clone, Debug)]
pub struct Command {
    pub paint: Paint,
    /// Non-normalized depth slot. The backend derives the actual depth as
    /// `1 - depth_count / n` (or `1 - depth_count * epsilon` for a
    /// precomputed epsilon), where `n` is the total command count of the
    /// pass.
    pub depth_count: u32,
    pub index_count: usize,
    pub kind: CommandType,
    pub vertex_buffer: Option<BufferView>,
    pub index_buffer: Option<BufferView>,
    /// Local-space bounds of the geometry.
    pub bounds: Rect,
    pub transform: Matrix,
    /// Whether the mesh can be drawn directly; non-convex meshes take the
    /// stencil-then-cover route.
    pub is_convex: bool,
    /// Present exactly when `kind` is [`CommandType::Clip`].
    pub clip_style: Option<ClipStyle>,
    /// Present exactly when `kind` is [`CommandType::Texture`].
    pub texture: Option<TextureProxy>,
}

/// One finalized offscreen layer.
#[derive(Debug)]
pub struct Offscreen {
    pub commands: Vec<Command>,
    /// The render target the layer's commands draw into.
    pub texture: TextureProxy,
    /// Half-resolution intermediate for separable blurs.
    pub filter_texture: Option<TextureProxy>,
    pub image_filter: Option<ImageFilter>,
    pub color_filter: Option<ColorFilter>,
    /// Device-space destination the layer composites into.
    pub bounds: Rect,
}

/// The immutable output of [`Canvas::prepare`].
///
/// Offscreens are ordered innermost first; the backend renders them
/// bottom-up before the onscreen pass.
#[derive(Debug, Default)]
pub struct RenderProgram {
    commands: Vec<Command>,
    offscreens: Vec<Offscreen>,
}

static_assertions::assert_impl_all!(RenderProgram: Send, Sync);

impl RenderProgram {
    /// The onscreen command stream.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The finalized offscreen layers, innermost first.
    pub fn offscreens(&self) -> &[Offscreen] {
        &self.offscreens
    }
}

/// One entry of the clip stack.
#[derive(Debug)]
struct ClipStackEntry {
    transform: Matrix,
    /// Running draw count, inclusive of nested entries that have been
    /// restored into this one.
    draw_count: u32,
    /// Indices into the current layer's command list of clips whose depth
    /// must be back-patched when this entry is restored.
    pending_clips: SmallVec<[usize; 4]>,
    is_save_layer: bool,
    alpha: f32,
}

impl Default for ClipStackEntry {
    fn default() -> Self {
        Self {
            transform: Matrix::IDENTITY,
            draw_count: 0,
            pending_clips: SmallVec::new(),
            is_save_layer: false,
            alpha: 1.0,
        }
    }
}

/// Recording state for one layer (or the onscreen target).
///
/// Two command lists are maintained: the recorded commands and the pending
/// commands. The pending list holds opaque draws, which are deferred as
/// long as possible so that they can be issued ahead of the blended work
/// they occlude. Once a command requiring a flush is recorded, the pending
/// commands are inserted in reverse order at the flush index.
///
/// Example (O - opaque, T - transparent, C - clip):
///
/// ```text
///  Command        Pending            Recorded               Flush Index
///     O1           ->O1                                          0
///     O2           O1 ->O2                                       0
///     T1           O1 O2                  ->T1                   0
///     T2           O1 O2               T1 ->T2                   0
///     C                               O2 O1 T1 T2 -> C           5
/// ```
///
/// Reversing the opaques means the GPU sees the foreground-most one first,
/// maximizing depth-test rejection of everything behind it.
#[derive(Debug, Default)]
struct CommandState {
    pending_commands: Vec<Command>,
    commands: Vec<Command>,
    flush_index: usize,
    /// Union of the device-space bounds of everything recorded.
    bounds_estimate: Option<Rect>,
    image_filter: Option<ImageFilter>,
    color_filter: Option<ColorFilter>,
    filter_texture: Option<TextureProxy>,
}

/// The drawing API.
///
/// A canvas records draws, clips and layers against a [`HostBuffer`] (which
/// receives the tessellated meshes) and a [`Tessellator`]. Calling
/// [`prepare`](Self::prepare) transfers everything recorded into an
/// immutable [`RenderProgram`] for the submission backend.
pub struct Canvas<'a> {
    host_buffer: &'a mut HostBuffer,
    tessellator: &'a mut Tessellator,
    clip_stack: Vec<ClipStackEntry>,
    pending_states: Vec<CommandState>,
    finalized_states: Vec<CommandState>,
    /// Offscreen render targets, parallel to `finalized_states`.
    textures: Vec<TextureProxy>,
}

impl<'a> Canvas<'a> {
    pub fn new(host_buffer: &'a mut HostBuffer, tessellator: &'a mut Tessellator) -> Self {
        Self {
            host_buffer,
            tessellator,
            clip_stack: vec![ClipStackEntry::default()],
            pending_states: vec![CommandState::default()],
            finalized_states: Vec::new(),
            textures: Vec::new(),
        }
    }

    // --- Transform management. ---

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.transform(&Matrix::translate(tx, ty, 0.0));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.transform(&Matrix::scale(sx, sy, 1.0));
    }

    /// Rotate about the origin; `radians` measures clockwise.
    pub fn rotate(&mut self, radians: f32) {
        self.transform(&Matrix::rotate(radians));
    }

    /// Post-multiply the current transform by `m`.
    pub fn transform(&mut self, m: &Matrix) {
        let top = self.top_mut();
        top.transform = top.transform * *m;
    }

    // --- Drawing. ---

    pub fn draw_rect(&mut self, rect: &Rect, paint: Paint) {
        let allocation =
            match self
                .host_buffer
                .allocate_persistent(6 * POINT_SIZE, 0, BUFFER_ALIGNMENT)
            {
                Ok(allocation) => allocation,
                Err(err) => {
                    log::warn!("dropping rect draw: {err}");
                    return;
                }
            };
        let quad = rect.get_quad();
        let dst = self
            .host_buffer
            .contents_mut(allocation.position, 6 * POINT_SIZE);
        bytemuck::cast_slice_mut::<u8, Point>(dst).copy_from_slice(&quad);

        let (depth_count, transform) = (self.top().draw_count, self.top().transform);
        self.record(Command {
            paint,
            depth_count,
            index_count: 6,
            kind: CommandType::Draw,
            vertex_buffer: Some(allocation.position),
            index_buffer: None,
            bounds: *rect,
            transform,
            is_convex: true,
            clip_style: None,
            texture: None,
        });
        self.top_mut().draw_count += 1;
    }

    pub fn draw_path(&mut self, path: &Path, paint: Paint) {
        let scale_factor = self.top().transform.basis_length_max();
        let (vertex_count, index_count) = if paint.stroke {
            self.tessellator
                .triangulate_stroke(path, paint.stroke_width, scale_factor)
        } else {
            self.tessellator.triangulate(path, scale_factor)
        };
        if vertex_count == 0 || index_count == 0 {
            self.tessellator.write(None, None);
            return;
        }
        let allocation = match self.host_buffer.allocate_persistent(
            vertex_count * POINT_SIZE,
            index_count * INDEX_SIZE,
            BUFFER_ALIGNMENT,
        ) {
            Ok(allocation) => allocation,
            Err(err) => {
                self.tessellator.write(None, None);
                log::warn!("dropping path draw: {err}");
                return;
            }
        };
        let (vertices, indices) = self.host_buffer.mesh_contents_mut(&allocation);
        self.tessellator.write(Some(vertices), Some(indices));

        let (depth_count, transform) = (self.top().draw_count, self.top().transform);
        self.record(Command {
            paint,
            depth_count,
            index_count,
            kind: CommandType::Draw,
            vertex_buffer: Some(allocation.position),
            index_buffer: Some(allocation.index),
            bounds: path.bounds(),
            transform,
            // Stroke quads are each locally convex, so stroked outlines
            // skip the stencil pass regardless of the source path.
            is_convex: path.is_convex() || paint.stroke,
            clip_style: None,
            texture: None,
        });
        self.top_mut().draw_count += 1;
    }

    /// Composite `texture` into `dest`, modulated by `alpha`.
    pub fn draw_texture(&mut self, dest: &Rect, texture: TextureProxy, alpha: f32) {
        let (depth_count, transform) = (self.top().draw_count, self.top().transform);
        self.record(Command {
            paint: Paint::from_color(Color::new(0.0, 0.0, 0.0, alpha)),
            depth_count,
            index_count: 0,
            kind: CommandType::Texture,
            vertex_buffer: None,
            index_buffer: None,
            bounds: *dest,
            transform,
            is_convex: true,
            clip_style: None,
            texture: Some(texture),
        });
        self.top_mut().draw_count += 1;
    }

    /// Restrict rendering to `path` until the enclosing save is restored.
    ///
    /// The clip's depth fence is unknown until that restore, so the command
    /// is recorded with a zero depth slot and back-patched.
    pub fn clip_path(&mut self, path: &Path, style: ClipStyle) {
        let scale_factor = self.top().transform.basis_length_max();
        // Clips always tessellate as fills.
        let (vertex_count, index_count) = self.tessellator.triangulate(path, scale_factor);
        let allocation = match self.host_buffer.allocate_persistent(
            vertex_count * POINT_SIZE,
            index_count * INDEX_SIZE,
            BUFFER_ALIGNMENT,
        ) {
            Ok(allocation) => allocation,
            Err(err) => {
                self.tessellator.write(None, None);
                log::warn!("dropping clip: {err}");
                return;
            }
        };
        let (vertices, indices) = self.host_buffer.mesh_contents_mut(&allocation);
        self.tessellator.write(Some(vertices), Some(indices));

        let transform = self.top().transform;
        self.record(Command {
            paint: Paint::default(),
            depth_count: 0,
            index_count,
            kind: CommandType::Clip,
            vertex_buffer: Some(allocation.position),
            index_buffer: Some(allocation.index),
            bounds: path.bounds(),
            transform,
            is_convex: path.is_convex(),
            clip_style: Some(style),
            texture: None,
        });
        let clip_index = self.current_state().commands.len() - 1;
        let top = self.top_mut();
        top.pending_clips.push(clip_index);
        top.draw_count += 1;
    }

    // --- Save / restore. ---

    /// Push an entry onto the clip stack.
    ///
    /// Clips applied after this save are lifted again by the matching
    /// [`restore`](Self::restore). Clips recorded inside the entry receive
    /// a depth fence covering every draw up to that restore, inclusive of
    /// nested entries, which is why the draw count accumulates into the
    /// entry.
    pub fn save(&mut self) {
        let (transform, draw_count) = (self.top().transform, self.top().draw_count);
        self.clip_stack.push(ClipStackEntry {
            transform,
            draw_count,
            ..Default::default()
        });
    }

    /// Like [`save`](Self::save), but also redirects subsequent drawing
    /// into an offscreen layer that is composited back (with `alpha` and
    /// the given filters) on the matching restore.
    pub fn save_layer(
        &mut self,
        alpha: f32,
        image_filter: Option<ImageFilter>,
        color_filter: Option<ColorFilter>,
    ) {
        let (transform, draw_count) = (self.top().transform, self.top().draw_count);
        self.clip_stack.push(ClipStackEntry {
            transform,
            draw_count,
            is_save_layer: true,
            alpha,
            ..Default::default()
        });
        self.pending_states.push(CommandState {
            image_filter,
            color_filter,
            ..Default::default()
        });
    }

    /// Pop the current clip stack entry.
    ///
    /// Restoring with only the root entry on the stack is a no-op.
    pub fn restore(&mut self) {
        if self.clip_stack.len() <= 1 {
            return;
        }
        self.restore_entry(true);
    }

    /// Finalize all recorded state into a [`RenderProgram`].
    ///
    /// Unrestored saves are unwound. An unrestored save-layer still
    /// finalizes into an offscreen, but no composite command is emitted
    /// for it since there is no meaningful restore point in the parent.
    pub fn prepare(mut self) -> RenderProgram {
        flush_pending(self.current_state_mut());
        while self.clip_stack.len() > 1 {
            self.restore_entry(false);
        }
        // Unwind the root entry so its clips receive their depth fence.
        if let Some(root) = self.clip_stack.pop() {
            let state = self.current_state_mut();
            for &clip_index in &root.pending_clips {
                state.commands[clip_index].depth_count = root.draw_count;
            }
        }

        let mut onscreen = self.pending_states.swap_remove(0);
        flush_pending(&mut onscreen);

        let offscreens = self
            .finalized_states
            .drain(..)
            .zip(self.textures.drain(..))
            .map(|(mut state, texture)| {
                flush_pending(&mut state);
                Offscreen {
                    commands: state.commands,
                    texture,
                    filter_texture: state.filter_texture,
                    image_filter: state.image_filter,
                    color_filter: state.color_filter,
                    bounds: state
                        .bounds_estimate
                        .unwrap_or(Rect::from_ltrb(0.0, 0.0, 1.0, 1.0)),
                }
            })
            .collect();

        RenderProgram {
            commands: onscreen.commands,
            offscreens,
        }
    }

    // --- Gradient allocation. ---

    /// Create a linear gradient between `start` and `end` from
    /// straight-alpha color stops.
    pub fn create_linear_gradient(
        &mut self,
        start: Point,
        end: Point,
        stops: &[Color],
    ) -> Result<Gradient> {
        let texture_index = self.create_gradient_texture(stops)?;
        Ok(Gradient::Linear {
            start,
            end,
            texture_index,
        })
    }

    /// Create a radial gradient about `center` from straight-alpha color
    /// stops.
    pub fn create_radial_gradient(
        &mut self,
        center: Point,
        radius: f32,
        stops: &[Color],
    ) -> Result<Gradient> {
        let texture_index = self.create_gradient_texture(stops)?;
        Ok(Gradient::Radial {
            center,
            radius,
            texture_index,
        })
    }

    /// Bake color stops into a registered 1xN BGRA texture, premultiplying
    /// at write time.
    fn create_gradient_texture(&mut self, stops: &[Color]) -> Result<u64> {
        let desc = TextureDescriptor {
            width: stops.len() as u32,
            height: 1,
            format: TextureFormat::Bgra8Unorm,
            usage: TextureUsage::SHADER_READ,
            storage_mode: StorageMode::Shared,
            sample_count: 1,
            lossy_compression: false,
        };
        let (texture, id) = self.host_buffer.allocate_texture(&desc)?;
        let mut bytes = Vec::with_capacity(4 * stops.len());
        for stop in stops {
            let color = stop.premultiply();
            bytes.push((255.0 * color.b) as u8);
            bytes.push((255.0 * color.g) as u8);
            bytes.push((255.0 * color.r) as u8);
            bytes.push((255.0 * color.a) as u8);
        }
        self.host_buffer.write_texture(texture, bytes);
        Ok(id)
    }

    // --- Internals. ---

    fn top(&self) -> &ClipStackEntry {
        self.clip_stack.last().expect("clip stack has a root entry")
    }

    fn top_mut(&mut self) -> &mut ClipStackEntry {
        self.clip_stack
            .last_mut()
            .expect("clip stack has a root entry")
    }

    fn current_state(&self) -> &CommandState {
        self.pending_states
            .last()
            .expect("at least the onscreen state")
    }

    fn current_state_mut(&mut self) -> &mut CommandState {
        self.pending_states
            .last_mut()
            .expect("at least the onscreen state")
    }

    /// Pop the top clip entry, back-patch its clips' depth fences, and (for
    /// save-layers) finalize the layer. `composite` controls whether the
    /// finalized layer is composited into its parent; it is false only for
    /// the implicit unwinding in [`prepare`](Self::prepare).
    fn restore_entry(&mut self, composite: bool) {
        let entry = match self.clip_stack.pop() {
            Some(entry) => entry,
            None => return,
        };
        // Popping means the depth fence for every clip recorded inside the
        // entry is now known: the entry's final draw count.
        {
            let state = self.current_state_mut();
            for &clip_index in &entry.pending_clips {
                state.commands[clip_index].depth_count = entry.draw_count;
            }
        }
        // Propagate the accumulated count so depth slots stay globally
        // monotonic.
        if let Some(parent) = self.clip_stack.last_mut() {
            parent.draw_count = entry.draw_count;
        }
        if !entry.is_save_layer {
            return;
        }

        flush_pending(self.current_state_mut());
        let mut state = self
            .pending_states
            .pop()
            .expect("layer states parallel the clip stack");

        let mut dest = state
            .bounds_estimate
            .unwrap_or(Rect::from_ltrb(0.0, 0.0, 1.0, 1.0));
        if let Some(ImageFilter::Gaussian { sigma }) = state.image_filter {
            // A Gaussian's support is effectively 3 sigma; the layer must
            // render that margin for the blur to sample.
            dest = dest.expand(3.0 * sigma, 3.0 * sigma);
            state.bounds_estimate = Some(dest);
        }

        let desc = TextureDescriptor {
            width: dest.width().ceil() as u32,
            height: dest.height().ceil() as u32,
            format: TextureFormat::Bgra8Unorm,
            usage: TextureUsage::RENDER_TARGET | TextureUsage::SHADER_READ,
            storage_mode: StorageMode::Private,
            sample_count: 1,
            lossy_compression: true,
        };
        let texture = match self.host_buffer.allocate_temp_texture(&desc) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("dropping layer: {err}");
                return;
            }
        };

        if matches!(state.image_filter, Some(ImageFilter::Gaussian { .. })) {
            let filter_desc = TextureDescriptor {
                width: (dest.width() / 2.0).ceil() as u32,
                height: (dest.height() / 2.0).ceil() as u32,
                ..desc
            };
            match self.host_buffer.allocate_temp_texture(&filter_desc) {
                Ok(filter_texture) => state.filter_texture = Some(filter_texture),
                Err(err) => {
                    log::warn!("dropping layer blur: {err}");
                    state.image_filter = None;
                }
            }
        }

        // Filtered layers composite at full alpha; the filter pipeline
        // applies its own modulation.
        let alpha = if state.image_filter.is_some() {
            1.0
        } else {
            entry.alpha
        };
        self.textures.push(texture);
        self.finalized_states.push(state);
        if composite {
            self.draw_texture(&dest, texture, alpha);
        }
    }

    /// Record a command into the current layer, deferring opaque draws.
    fn record(&mut self, cmd: Command) {
        let state = self
            .pending_states
            .last_mut()
            .expect("at least the onscreen state");
        let device_bounds = cmd.transform.transform_bounds(&cmd.bounds);
        state.bounds_estimate = Some(match state.bounds_estimate {
            Some(estimate) => estimate.union(&device_bounds),
            None => device_bounds,
        });

        if cmd.kind == CommandType::Clip {
            flush_pending(state);
            state.commands.push(cmd);
            state.flush_index = state.commands.len();
        } else if cmd.paint.is_opaque() && cmd.kind == CommandType::Draw {
            state.pending_commands.push(cmd);
        } else {
            state.commands.push(cmd);
        }
    }
}

/// Insert the reversed pending-opaque list at the flush index.
fn flush_pending(state: &mut CommandState) {
    if state.pending_commands.is_empty() {
        return;
    }
    let pending = std::mem::take(&mut state.pending_commands);
    let at = state.flush_index;
    state.commands.splice(at..at, pending.into_iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_buffer::DeviceLimits;
    use crate::path::PathBuilder;

    fn triangle_path() -> Path {
        let mut builder = PathBuilder::new();
        builder.move_to(Point::new(0.0, 0.0));
        builder.line_to(Point::new(10.0, 0.0));
        builder.line_to(Point::new(5.0, 10.0));
        builder.close();
        builder.take_path()
    }

    fn opaque(r: f32) -> Paint {
        Paint::from_color(Color::new(r, 0.0, 0.0, 1.0))
    }

    fn translucent() -> Paint {
        Paint::from_color(Color::new(0.0, 0.0, 1.0, 0.5))
    }

    #[test]
    fn empty_canvas_prepares_to_nothing() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        let program = canvas.prepare();
        assert!(program.commands().is_empty());
        assert!(program.offscreens().is_empty());
    }

    #[test]
    fn single_opaque_rect() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 10.0, 10.0), opaque(1.0));
        let program = canvas.prepare();

        assert_eq!(program.commands().len(), 1);
        let cmd = &program.commands()[0];
        assert_eq!(cmd.depth_count, 0);
        assert_eq!(cmd.index_count, 6);
        assert_eq!(cmd.kind, CommandType::Draw);
        assert!(cmd.index_buffer.is_none());
        assert!(cmd.is_convex);

        let view = cmd.vertex_buffer.unwrap();
        let bytes = &host_buffer.buffer_bytes(view.buffer)[view.offset..view.offset + 48];
        let points: &[Point] = bytemuck::cast_slice(bytes);
        let expected = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
        ];
        assert_eq!(points, expected);
    }

    #[test]
    fn opaque_draws_flush_reversed_before_clips() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 1.0, 1.0), opaque(0.1));
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 2.0, 2.0), opaque(0.2));
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 3.0, 3.0), translucent());
        canvas.clip_path(&triangle_path(), ClipStyle::Intersect);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 4.0, 4.0), opaque(0.4));
        let program = canvas.prepare();

        let kinds: Vec<CommandType> = program.commands().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            [
                CommandType::Draw,
                CommandType::Draw,
                CommandType::Draw,
                CommandType::Clip,
                CommandType::Draw,
            ]
        );
        // The two opaques recorded before the clip flush in reverse issue
        // order ahead of the transparent; the post-clip opaque flushes at
        // the post-clip index on prepare. The clip's fence covers every
        // draw up to the closing restore, so prepare patches it to 5.
        let depths: Vec<u32> = program.commands().iter().map(|c| c.depth_count).collect();
        assert_eq!(depths, [1, 0, 2, 5, 4]);
    }

    #[test]
    fn opaque_only_canvas_is_fully_reversed() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        for i in 0..4 {
            canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 1.0 + i as f32, 1.0), opaque(0.5));
        }
        let program = canvas.prepare();
        let depths: Vec<u32> = program.commands().iter().map(|c| c.depth_count).collect();
        assert_eq!(depths, [3, 2, 1, 0]);
    }

    #[test]
    fn clip_depth_fences_are_patched() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.save();
        canvas.clip_path(&triangle_path(), ClipStyle::Intersect);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 5.0, 5.0), translucent());
        canvas.draw_rect(&Rect::from_ltrb(1.0, 1.0, 6.0, 6.0), translucent());
        canvas.restore();
        canvas.draw_rect(&Rect::from_ltrb(2.0, 2.0, 7.0, 7.0), translucent());
        let program = canvas.prepare();

        let n = program.commands().len() as u32;
        for cmd in program.commands() {
            if cmd.kind == CommandType::Clip {
                // The fence covers the clip itself and the two draws inside
                // the save.
                assert_eq!(cmd.depth_count, 3);
            }
            assert!(cmd.depth_count <= n);
        }
        // The draw after the restore continues the global numbering.
        assert_eq!(program.commands().last().unwrap().depth_count, 3);
    }

    #[test]
    fn unrestored_clip_is_patched_by_prepare() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        canvas.clip_path(&triangle_path(), ClipStyle::Difference);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 5.0, 5.0), translucent());
        let program = canvas.prepare();

        for cmd in program.commands() {
            if cmd.kind == CommandType::Clip {
                assert_eq!(cmd.clip_style, Some(ClipStyle::Difference));
                assert_ne!(cmd.depth_count, 0);
            }
        }
    }

    #[test]
    fn restore_at_root_is_a_noop() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        canvas.restore();
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 1.0, 1.0), translucent());
        canvas.restore();
        let program = canvas.prepare();
        assert_eq!(program.commands().len(), 1);
        assert!(program.offscreens().is_empty());
    }

    #[test]
    fn transform_stack_scopes_with_save_restore() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.translate(10.0, 0.0);
        canvas.save();
        canvas.scale(2.0, 2.0);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 1.0, 1.0), translucent());
        canvas.restore();
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 1.0, 1.0), translucent());
        let program = canvas.prepare();

        let scaled = &program.commands()[0];
        let unscaled = &program.commands()[1];
        assert_eq!(
            scaled.transform.transform_point(Point::new(1.0, 1.0)),
            Point::new(12.0, 2.0)
        );
        assert_eq!(
            unscaled.transform.transform_point(Point::new(1.0, 1.0)),
            Point::new(11.0, 1.0)
        );
    }

    #[test]
    fn stroke_paint_dispatches_to_stroke_tessellation() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        let paint = Paint {
            stroke: true,
            stroke_width: 2.0,
            ..Paint::from_color(Color::new(0.0, 0.5, 0.0, 0.5))
        };
        canvas.draw_path(&triangle_path(), paint);
        let program = canvas.prepare();

        let cmd = &program.commands()[0];
        // Three edges -> three quads -> six triangles.
        assert_eq!(cmd.index_count, 18);
        assert!(cmd.is_convex);
    }

    #[test]
    fn empty_path_draw_is_silently_skipped() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);
        let empty = PathBuilder::new().take_path();
        canvas.draw_path(&empty, opaque(1.0));
        // The discarded mesh must not leak into the next draw.
        canvas.draw_path(&triangle_path(), translucent());
        let program = canvas.prepare();
        assert_eq!(program.commands().len(), 1);
        assert_eq!(program.commands()[0].index_count, 9);
    }

    #[test]
    fn failed_allocation_drops_the_command() {
        let mut host_buffer = HostBuffer::with_limits(DeviceLimits {
            max_buffer_size: 32 * 1024,
            max_texture_extent: 4096,
        });
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        // A polygon too large for any permissible buffer.
        let mut builder = PathBuilder::new();
        builder.move_to(Point::new(0.0, 0.0));
        for i in 0..10_000 {
            builder.line_to(Point::new(i as f32, (i % 5) as f32));
        }
        builder.close();
        canvas.draw_path(&builder.take_path(), translucent());
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 1.0, 1.0), translucent());
        let program = canvas.prepare();

        // Only the rect survived, and the tessellator state was discarded.
        assert_eq!(program.commands().len(), 1);
        assert_eq!(program.commands()[0].index_count, 6);
    }

    #[test]
    fn save_layer_composites_at_alpha() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.save_layer(0.5, None, None);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 10.0, 10.0), opaque(1.0));
        canvas.restore();
        let program = canvas.prepare();

        assert_eq!(program.offscreens().len(), 1);
        let offscreen = &program.offscreens()[0];
        assert_eq!(offscreen.commands.len(), 1);
        assert_eq!(offscreen.bounds, Rect::from_ltrb(0.0, 0.0, 10.0, 10.0));
        assert_eq!(offscreen.texture.width, 10);
        assert_eq!(offscreen.texture.height, 10);
        assert!(offscreen.filter_texture.is_none());

        // The parent holds exactly the composite.
        assert_eq!(program.commands().len(), 1);
        let composite = &program.commands()[0];
        assert_eq!(composite.kind, CommandType::Texture);
        assert_eq!(composite.paint.color.a, 0.5);
        assert_eq!(composite.texture.unwrap().id, offscreen.texture.id);
    }

    #[test]
    fn gaussian_layer_expands_bounds_and_gets_filter_texture() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.save_layer(0.5, Some(ImageFilter::Gaussian { sigma: 4.0 }), None);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 10.0, 10.0), opaque(1.0));
        canvas.restore();
        let program = canvas.prepare();

        let offscreen = &program.offscreens()[0];
        assert_eq!(offscreen.bounds, Rect::from_ltrb(-12.0, -12.0, 22.0, 22.0));
        assert_eq!(offscreen.texture.width, 34);
        assert_eq!(offscreen.texture.height, 34);
        let filter_texture = offscreen.filter_texture.unwrap();
        assert_eq!(filter_texture.width, 17);
        assert_eq!(filter_texture.height, 17);

        // Filtered layers composite at full alpha; the blur pass applies
        // the layer alpha itself.
        let composite = &program.commands()[0];
        assert_eq!(composite.kind, CommandType::Texture);
        assert_eq!(composite.paint.color.a, 1.0);
    }

    #[test]
    fn nested_layers_finalize_innermost_first() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.save_layer(1.0, None, None);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 100.0, 100.0), translucent());
        canvas.save_layer(1.0, None, None);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 50.0, 50.0), translucent());
        canvas.restore();
        canvas.restore();
        let program = canvas.prepare();

        assert_eq!(program.offscreens().len(), 2);
        assert_eq!(program.offscreens()[0].texture.width, 50);
        // The outer layer's estimate includes the inner layer's composite.
        assert_eq!(program.offscreens()[1].texture.width, 100);
    }

    #[test]
    fn unrestored_layer_finalizes_without_composite() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 4.0, 4.0), translucent());
        canvas.save_layer(0.5, None, None);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 8.0, 8.0), translucent());
        let program = canvas.prepare();

        assert_eq!(program.offscreens().len(), 1);
        assert_eq!(program.offscreens()[0].commands.len(), 1);
        // No composite was recorded for the implicitly closed layer.
        assert_eq!(program.commands().len(), 1);
        assert!(program
            .commands()
            .iter()
            .all(|c| c.kind != CommandType::Texture));
    }

    #[test]
    fn gradient_stops_upload_premultiplied_bgra() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        let gradient = canvas
            .create_linear_gradient(
                Point::ZERO,
                Point::new(1.0, 0.0),
                &[Color::RED, Color::new(0.0, 0.0, 1.0, 0.5)],
            )
            .unwrap();
        let Gradient::Linear { texture_index, .. } = gradient else {
            panic!("expected a linear gradient");
        };
        let texture = host_buffer.texture(texture_index).unwrap();
        assert_eq!(texture.width, 2);
        assert_eq!(texture.height, 1);

        let uploads = host_buffer.take_texture_uploads();
        assert_eq!(uploads.len(), 1);
        // Red, then half-transparent blue premultiplied, both as BGRA.
        assert_eq!(uploads[0].bytes, [0, 0, 255, 255, 127, 0, 0, 127]);
    }

    #[test]
    fn layer_bounds_estimate_uses_device_space() {
        let mut host_buffer = HostBuffer::new();
        let mut tessellator = Tessellator::new();
        let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

        canvas.save_layer(1.0, None, None);
        canvas.translate(100.0, 100.0);
        canvas.draw_rect(&Rect::from_ltrb(0.0, 0.0, 10.0, 10.0), translucent());
        canvas.restore();
        let program = canvas.prepare();

        assert_eq!(
            program.offscreens()[0].bounds,
            Rect::from_ltrb(100.0, 100.0, 110.0, 110.0)
        );
    }
}
