// Copyright 2026 the Fresco Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end checks of the recording pipeline through the public API, the
//! way a submission backend would consume it.

use fresco::{
    Canvas, ClipStyle, Color, CommandType, HostBuffer, ImageFilter, Paint, PathBuilder, Point,
    Rect, Tessellator,
};

fn circleish_path(cx: f32, cy: f32, r: f32) -> fresco::Path {
    // Four cubic arcs approximating a circle.
    const K: f32 = 0.5523;
    let mut builder = PathBuilder::new();
    builder.move_to(Point::new(cx + r, cy));
    builder.cubic_to(
        Point::new(cx + r, cy + K * r),
        Point::new(cx + K * r, cy + r),
        Point::new(cx, cy + r),
    );
    builder.cubic_to(
        Point::new(cx - K * r, cy + r),
        Point::new(cx - r, cy + K * r),
        Point::new(cx - r, cy),
    );
    builder.cubic_to(
        Point::new(cx - r, cy - K * r),
        Point::new(cx - K * r, cy - r),
        Point::new(cx, cy - r),
    );
    builder.cubic_to(
        Point::new(cx + K * r, cy - r),
        Point::new(cx + r, cy - K * r),
        Point::new(cx + r, cy),
    );
    builder.close();
    builder.take_path()
}

/// After prepare, every clip has received a depth fence and every depth
/// slot is within the command count, in every command list of the program.
#[test]
fn prepared_programs_have_patched_monotonic_depths() {
    let mut host_buffer = HostBuffer::new();
    let mut tessellator = Tessellator::new();
    let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

    canvas.draw_rect(
        &Rect::from_ltrb(0.0, 0.0, 100.0, 100.0),
        Paint::from_color(Color::WHITE),
    );
    canvas.save();
    canvas.clip_path(&circleish_path(50.0, 50.0, 40.0), ClipStyle::Intersect);
    canvas.draw_path(
        &circleish_path(50.0, 50.0, 30.0),
        Paint::from_color(Color::RED.with_alpha(0.7)),
    );
    canvas.restore();
    canvas.save_layer(0.8, None, None);
    canvas.draw_rect(
        &Rect::from_ltrb(20.0, 20.0, 60.0, 60.0),
        Paint::from_color(Color::BLUE),
    );
    canvas.clip_path(&circleish_path(40.0, 40.0, 10.0), ClipStyle::Difference);
    canvas.draw_rect(
        &Rect::from_ltrb(30.0, 30.0, 50.0, 50.0),
        Paint::from_color(Color::GREEN.with_alpha(0.5)),
    );
    canvas.restore();
    let program = canvas.prepare();

    let lists: Vec<&[fresco::Command]> = std::iter::once(program.commands())
        .chain(program.offscreens().iter().map(|o| o.commands.as_slice()))
        .collect();
    // Depth slots are numbered globally across layers, so the bound is the
    // total command count of the program.
    let total: u32 = lists.iter().map(|l| l.len() as u32).sum();
    for commands in lists {
        for cmd in commands {
            if cmd.kind == CommandType::Clip {
                assert_ne!(cmd.depth_count, 0, "unpatched clip survived prepare");
            }
            assert!(cmd.depth_count <= total);
        }
    }
}

/// Within a pre-clip segment, opaque draws appear in reverse issue order:
/// higher depth slots (later issues) come first.
#[test]
fn opaque_draws_precede_in_reverse_issue_order() {
    let mut host_buffer = HostBuffer::new();
    let mut tessellator = Tessellator::new();
    let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

    for i in 0..3 {
        canvas.draw_rect(
            &Rect::from_ltrb(0.0, 0.0, 10.0 + i as f32, 10.0),
            Paint::from_color(Color::RED),
        );
    }
    canvas.draw_rect(
        &Rect::from_ltrb(0.0, 0.0, 50.0, 50.0),
        Paint::from_color(Color::BLUE.with_alpha(0.25)),
    );
    canvas.clip_path(&circleish_path(5.0, 5.0, 5.0), ClipStyle::Intersect);
    for i in 0..2 {
        canvas.draw_rect(
            &Rect::from_ltrb(0.0, 0.0, 20.0 + i as f32, 10.0),
            Paint::from_color(Color::GREEN),
        );
    }
    let program = canvas.prepare();

    let clip_position = program
        .commands()
        .iter()
        .position(|c| c.kind == CommandType::Clip)
        .unwrap();
    let opaque_depths = |commands: &[fresco::Command]| -> Vec<u32> {
        commands
            .iter()
            .filter(|c| c.kind == CommandType::Draw && c.paint.is_opaque())
            .map(|c| c.depth_count)
            .collect()
    };
    let before = opaque_depths(&program.commands()[..clip_position]);
    let after = opaque_depths(&program.commands()[clip_position + 1..]);
    assert_eq!(before, [2, 1, 0]);
    assert_eq!(after, [6, 5]);
}

/// A gaussian save-layer grows its bounds by three sigma, allocates the
/// offscreen and half-resolution filter targets, and composites at full
/// alpha; the backend sees them innermost first.
#[test]
fn gaussian_layer_round_trip() {
    let mut host_buffer = HostBuffer::new();
    let mut tessellator = Tessellator::new();
    let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

    canvas.save_layer(0.25, Some(ImageFilter::Gaussian { sigma: 4.0 }), None);
    canvas.draw_rect(
        &Rect::from_ltrb(0.0, 0.0, 10.0, 10.0),
        Paint::from_color(Color::RED),
    );
    canvas.restore();
    let program = canvas.prepare();

    assert_eq!(program.offscreens().len(), 1);
    let offscreen = &program.offscreens()[0];
    assert_eq!(offscreen.bounds, Rect::from_ltrb(-12.0, -12.0, 22.0, 22.0));
    assert_eq!((offscreen.texture.width, offscreen.texture.height), (34, 34));
    let filter = offscreen.filter_texture.expect("separable blur target");
    assert_eq!((filter.width, filter.height), (17, 17));

    let composite = program
        .commands()
        .iter()
        .find(|c| c.kind == CommandType::Texture)
        .expect("composite for the restored layer");
    assert_eq!(composite.paint.color.a, 1.0);
    assert_eq!(composite.bounds, offscreen.bounds);
}

/// Mesh data recorded through the canvas is readable from the host buffer
/// exactly where the command's views say it is.
#[test]
fn commands_reference_live_mesh_data() {
    let mut host_buffer = HostBuffer::new();
    let mut tessellator = Tessellator::new();
    let mut canvas = Canvas::new(&mut host_buffer, &mut tessellator);

    let path = circleish_path(10.0, 10.0, 5.0);
    canvas.draw_path(&path, Paint::from_color(Color::RED.with_alpha(0.5)));
    let program = canvas.prepare();

    let cmd = &program.commands()[0];
    let vertex_view = cmd.vertex_buffer.unwrap();
    let index_view = cmd.index_buffer.unwrap();
    let index_bytes = &host_buffer.buffer_bytes(index_view.buffer)
        [index_view.offset..index_view.offset + cmd.index_count * 2];
    let indices: &[u16] = bytemuck::cast_slice(index_bytes);
    let max_index = *indices.iter().max().unwrap() as usize;
    let vertex_bytes = &host_buffer.buffer_bytes(vertex_view.buffer)
        [vertex_view.offset..vertex_view.offset + (max_index + 1) * 8];
    let vertices: &[Point] = bytemuck::cast_slice(vertex_bytes);
    // Every vertex of the flattened circle lies within the path bounds.
    for v in vertices {
        assert!(v.x >= 4.9 && v.x <= 15.1, "{v:?}");
        assert!(v.y >= 4.9 && v.y <= 15.1, "{v:?}");
    }
}

/// The transient arena serves per-frame uniform space and survives a
/// full triple-buffer cycle, which is how a backend uses it between
/// prepare calls.
#[test]
fn transient_arena_frames() {
    let mut host_buffer = HostBuffer::new();
    let mut first_frame_views = Vec::new();
    for _ in 0..16 {
        first_frame_views.push(host_buffer.transient_arena(256, 16).unwrap());
    }
    host_buffer.increment_transient_buffer();
    let second = host_buffer.transient_arena(256, 16).unwrap();
    assert_ne!(second.buffer, first_frame_views[0].buffer);
    host_buffer.increment_transient_buffer();
    host_buffer.increment_transient_buffer();
    let wrapped = host_buffer.transient_arena(256, 16).unwrap();
    assert_eq!(wrapped.buffer, first_frame_views[0].buffer);
    assert_eq!(wrapped.offset, first_frame_views[0].offset);
}
