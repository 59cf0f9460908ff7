// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A renderless drag session: one draggable card, one synthetic finger.
//!
//! Run with `cargo run -p overstory_behavior --example drag_surface`.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use overstory_behavior::Sliding;
use overstory_core::{Context, Prototype, TouchSample};
use overstory_hit::ShapeKind;
use overstory_transform::Srt;

fn main() {
    let context = Context::new();

    let card = Prototype::with_shape("card", ShapeKind::Rectangle)
        .at(Srt::from_translation(Vec3::new(0.0, 0.0, 1.0)))
        .behave_with(Arc::new(Sliding::default()));
    context.add_or_update_elements(true, [&card]);

    let element = context.roots()[0].clone();
    element.events().touch_begin.subscribe("demo", |args| {
        println!("touch {} grabbed the card", args.touch.id());
    });
    element.events().interaction_end.subscribe("demo", |_| {
        println!("released");
    });

    // Sixty frames: the finger lands, sweeps right, lifts, and the card
    // glides on with the flick.
    for frame in 0..60 {
        let samples = if frame < 30 {
            vec![TouchSample::new(
                Vec2::new(frame as f32 * 0.01, 0.0),
                0,
                1.0,
            )]
        } else {
            Vec::new()
        };
        context
            .mainloop(
                &samples,
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                1.0 / 60.0,
            )
            .expect("frame");

        if frame % 10 == 9 {
            let p = element.display_transform().translation();
            println!("frame {frame:2}: card at ({:+.3}, {:+.3})", p.x, p.y);
        }
    }
}
