// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end pipeline tests: whole frames driven through a context with
//! identity camera matrices and a plane at z = 0.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{Mat4, Quat, Vec2, Vec3};
use overstory_core::{
    Context, ContextOptions, FadePhase, Prototype, Signal, SubContextOptions, TouchEventArgs,
    TouchSample,
};
use overstory_hit::ShapeKind;
use overstory_transform::Srt;

const DT: f32 = 1.0 / 60.0;

fn step(context: &Context, samples: &[TouchSample]) {
    context
        .mainloop(samples, Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY, DT)
        .unwrap();
}

fn run(context: &Context, samples: &[TouchSample], frames: usize) {
    for _ in 0..frames {
        step(context, samples);
    }
}

fn rect_at(name: &str, z: f32) -> Prototype {
    Prototype::with_shape(name, ShapeKind::Rectangle)
        .at(Srt::from_translation(Vec3::new(0.0, 0.0, z)))
}

fn count_events(signal: &Signal<TouchEventArgs>, id: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    signal.subscribe(id, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[test]
fn hit_begin_and_touch_begin_on_first_frame() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    let element = context.roots()[0].clone();
    let hit_begins = count_events(&element.events().hit_begin, "t");
    let touch_begins = count_events(&element.events().touch_begin, "t");
    let interaction_begins = count_events(&element.events().interaction_begin, "t");

    step(&context, &[TouchSample::new(Vec2::ZERO, 7, 1.0)]);

    assert_eq!(hit_begins.load(Ordering::SeqCst), 1);
    assert_eq!(touch_begins.load(Ordering::SeqCst), 1);
    assert_eq!(interaction_begins.load(Ordering::SeqCst), 1);
    assert_eq!(element.touching().len(), 1);
    assert!(element.hit());
    assert!(element.touched());
}

#[test]
fn transparency_chain_stops_after_first_opaque() {
    let context = Context::new();
    let glass = rect_at("glass", 0.5).transparent(true);
    let wall = rect_at("wall", 1.0);
    let behind = rect_at("behind", 2.0);
    context.add_or_update_elements(true, [&glass, &wall, &behind]);

    step(&context, &[TouchSample::new(Vec2::ZERO, 1, 1.0)]);

    let by_name = |name: &str| context.find(name)[0].clone();
    assert_eq!(by_name("glass").hovering().len(), 1);
    assert_eq!(by_name("wall").hovering().len(), 1);
    assert!(
        by_name("behind").hovering().is_empty(),
        "the opaque wall occludes everything past it"
    );

    // The touch's chain is depth-ordered and every element before the
    // last is transparent.
    let touch = context.touch_by_id(1).unwrap();
    let chain: Vec<String> = touch
        .attached_elements()
        .iter()
        .map(|e| e.name())
        .collect();
    assert_eq!(chain, vec!["glass".to_owned(), "wall".to_owned()]);
    let attached = touch.attached_elements();
    for element in &attached[..attached.len() - 1] {
        assert!(element.transparent());
    }
}

#[test]
fn slide_off_keeps_interaction_without_intersection() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    let element = context.roots()[0].clone();
    let hit_ends = count_events(&element.events().hit_end, "t");

    step(&context, &[TouchSample::new(Vec2::ZERO, 1, 1.0)]);
    assert!(element.hit());

    // The pressed touch slides far off the unit rectangle.
    step(&context, &[TouchSample::new(Vec2::new(2.0, 0.0), 1, 1.0)]);

    assert_eq!(hit_ends.load(Ordering::SeqCst), 1);
    assert!(!element.hit());
    assert!(element.touched(), "the interaction survives the slide-off");
    let touching = element.touching();
    assert_eq!(touching.len(), 1);
    assert!(touching[0].intersection.is_none());
    assert!(
        touching[0].persistent.is_some(),
        "the carrier-plane intersection keeps tracking the touch"
    );
}

#[test]
fn touch_end_fires_after_expiry() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    let element = context.roots()[0].clone();
    let touch_ends = count_events(&element.events().touch_end, "t");
    let interaction_ends = count_events(&element.events().interaction_end, "t");

    step(&context, &[TouchSample::new(Vec2::ZERO, 1, 1.0)]);
    assert!(element.touched());

    // Two empty frames: the touch exceeds consider_released_after = 1.
    step(&context, &[]);
    step(&context, &[]);

    assert_eq!(touch_ends.load(Ordering::SeqCst), 1);
    assert_eq!(interaction_ends.load(Ordering::SeqCst), 1);
    assert!(!element.touched());

    // The table itself drops the touch at the next frame's sweep.
    step(&context, &[]);
    assert_eq!(context.touch_count(), 0, "expired touches leave the table");
}

#[test]
fn fade_out_cascade_with_child_delay() {
    let context = Context::new();
    let mut parent = rect_at("parent", 0.0);
    parent.fade.fade_out_time = 1.0;
    let mut child = rect_at("child", 0.1);
    child.fade.fade_out_time = 1.0;
    child.fade.fade_out_delay = 0.5;
    let child_id = parent.add_child(child).unwrap();
    context.add_or_update_elements(true, [&parent]);
    step(&context, &[]);

    let parent_element = context.roots()[0].clone();
    let child_element = parent_element.child(child_id).unwrap();

    parent_element.start_deletion();
    assert_eq!(parent_element.fade_phase(), FadePhase::FadingOut);
    assert_eq!(child_element.fade_phase(), FadePhase::FadingOut);

    // One second of frames.
    run(&context, &[], 60);

    assert!(parent_element.delete_me(), "parent ramp is complete");
    assert_eq!(
        child_element.fade_phase(),
        FadePhase::FadingOut,
        "child is still mid-ramp thanks to its delay"
    );
    let child_fade = child_element.element_fade();
    assert!(
        (child_fade - 0.5).abs() < 0.05,
        "child fade should be ~0.5, was {child_fade}"
    );

    // The child finishes half a second later and the subtree unloads.
    run(&context, &[], 35);
    assert_eq!(context.element_count(), 0);
}

#[test]
fn update_while_fading_out_revives() {
    let context = Context::new();
    let mut proto = rect_at("panel", 0.0);
    proto.fade.fade_in_time = 1.0;
    proto.fade.fade_out_time = 1.0;
    context.add_or_update_elements(true, [&proto]);
    let element = context.roots()[0].clone();

    let faded_in = Arc::new(AtomicUsize::new(0));
    {
        let counter = faded_in.clone();
        element.events().faded_in.subscribe("t", move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    run(&context, &[], 61);
    assert_eq!(element.fade_phase(), FadePhase::Visible);
    assert_eq!(faded_in.load(Ordering::SeqCst), 1);

    element.start_deletion();
    run(&context, &[], 30);
    assert_eq!(element.fade_phase(), FadePhase::FadingOut);
    assert!((element.element_fade() - 0.5).abs() < 0.05);

    // The descriptor returns: the element revives and climbs back.
    context.add_or_update_elements(false, [&proto]);
    assert_eq!(element.fade_phase(), FadePhase::FadingIn);

    run(&context, &[], 25);
    assert_eq!(faded_in.load(Ordering::SeqCst), 1, "not yet fully back");
    run(&context, &[], 10);
    assert_eq!(faded_in.load(Ordering::SeqCst), 2, "~0.5 s to climb back");
    assert_eq!(element.fade_phase(), FadePhase::Visible);
    assert_eq!(element.element_fade(), 1.0);
    assert!(!element.delete_me());
}

#[test]
fn zero_fade_out_deletes_in_the_same_frame() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    step(&context, &[]);
    let element = context.roots()[0].clone();
    element.start_deletion();
    assert!(element.delete_me(), "zero-length ramp deletes synchronously");
    step(&context, &[]);
    assert_eq!(context.element_count(), 0);
}

#[test]
fn zero_fade_in_is_visible_after_first_frame() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    step(&context, &[]);
    let element = context.roots()[0].clone();
    assert_eq!(element.fade_phase(), FadePhase::Visible);
    assert_eq!(element.element_fade(), 1.0);
}

#[test]
fn unpressed_touch_hits_but_never_touches() {
    let context = Context::with_options(ContextOptions {
        minimum_force: 0.5,
        ..ContextOptions::default()
    });
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    let element = context.roots()[0].clone();
    let hit_begins = count_events(&element.events().hit_begin, "t");
    let touch_begins = count_events(&element.events().touch_begin, "t");

    run(&context, &[TouchSample::new(Vec2::ZERO, 1, 0.1)], 3);

    assert_eq!(hit_begins.load(Ordering::SeqCst), 1);
    assert_eq!(touch_begins.load(Ordering::SeqCst), 0);
    assert!(element.hit());
    assert!(!element.touched());
}

#[test]
fn touch_identity_is_stable_across_frames() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);

    step(&context, &[TouchSample::new(Vec2::ZERO, 5, 1.0)]);
    let first = context.touch_by_id(5).unwrap();
    // One absent frame is within consider_released_after = 1.
    step(&context, &[]);
    step(&context, &[TouchSample::new(Vec2::new(0.1, 0.0), 5, 1.0)]);
    let second = context.touch_by_id(5).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn world_matrices_compose_and_revalidate() {
    let context = Context::new();
    let mut parent = rect_at("parent", 0.0);
    parent.display_transform = Srt::from_translation(Vec3::new(1.0, 0.0, 0.0));
    let child = rect_at("child", 0.0).at(Srt {
        translation: Vec3::new(0.0, 2.0, 0.0),
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    });
    let child_id = parent.add_child(child).unwrap();
    context.add_or_update_elements(true, [&parent]);
    step(&context, &[]);

    let parent_element = context.roots()[0].clone();
    let child_element = parent_element.child(child_id).unwrap();

    // world = parent_world * local
    let expected = parent_element.display_matrix()
        * child_element.display_transform().matrix();
    assert_eq!(child_element.display_matrix(), expected);
    let origin = child_element.display_matrix().transform_point3(Vec3::ZERO);
    assert!((origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);

    // Mutating the parent is visible on the next child read, no frame
    // in between.
    parent_element
        .display_transform()
        .set_translation(Vec3::new(-1.0, 0.0, 0.0));
    let origin = child_element.display_matrix().transform_point3(Vec3::ZERO);
    assert!((origin - Vec3::new(-1.0, 2.0, 0.0)).length() < 1e-5);

    // Parent↔child integrity.
    assert!(Arc::ptr_eq(
        &child_element.parent().unwrap(),
        &parent_element
    ));
    assert!(Arc::ptr_eq(
        &parent_element.child(child_element.id()).unwrap(),
        &child_element
    ));
}

#[test]
fn prototype_round_trip_preserves_the_tree() {
    let context = Context::new();
    let mut root = rect_at("root", 0.0);
    root.transparent = true;
    let leaf = Prototype::with_shape("leaf", ShapeKind::Circle)
        .at(Srt::from_translation(Vec3::new(0.2, 0.0, 0.0)));
    root.add_child(leaf);
    context.add_or_update_elements(true, [&root]);
    step(&context, &[]);
    let original = context.roots()[0].clone();

    let copy_proto = original.to_prototype(true);
    assert_ne!(copy_proto.id, original.id(), "regenerated ids");
    context.add_or_update_elements(false, [&copy_proto]);
    step(&context, &[]);

    let copy = context
        .roots()
        .into_iter()
        .find(|e| e.id() == copy_proto.id)
        .unwrap();
    assert_eq!(copy.name(), original.name());
    assert_eq!(copy.transparent(), original.transparent());
    assert_eq!(copy.children().len(), 1);
    let copy_leaf = &copy.children()[0];
    assert_eq!(copy_leaf.name(), "leaf");
    assert_eq!(copy_leaf.shape(), ShapeKind::Circle);
    assert_eq!(
        copy_leaf.display_transform().translation(),
        Vec3::new(0.2, 0.0, 0.0)
    );
}

#[test]
fn remove_missing_starts_deletion() {
    let context = Context::new();
    let keep = rect_at("keep", 0.0);
    let drop = rect_at("drop", 1.0);
    context.add_or_update_elements(true, [&keep, &drop]);
    step(&context, &[]);
    assert_eq!(context.element_count(), 2);

    context.add_or_update_elements(true, [&keep]);
    // Zero-length fades delete synchronously; the sweep runs next frame.
    step(&context, &[]);
    assert_eq!(context.element_count(), 1);
    assert_eq!(context.roots().len(), 1);
    assert_eq!(context.roots()[0].name(), "keep");
}

#[test]
fn path_queries_resolve_globs() {
    let context = Context::new();
    let mut root = rect_at("menu", 0.0);
    root.add_child(rect_at("item_ok", 0.1));
    root.add_child(rect_at("item_cancel", 0.2));
    context.add_or_update_elements(true, [&root]);

    assert_eq!(context.find("menu/item_*").len(), 2);
    assert_eq!(context.find("**/item_ok").len(), 1);
    assert_eq!(context.find("menu/item_{ok,cancel}").len(), 2);
    assert!(context.find("menu/missing").is_empty());

    let root_element = context.roots()[0].clone();
    assert_eq!(root_element.find("item_ok").len(), 1);
}

#[test]
fn mouse_wheel_events_reach_hit_elements() {
    let context = Context::new();
    context.add_or_update_elements(true, [&rect_at("panel", 0.0)]);
    let element = context.roots()[0].clone();

    let wheel_deltas = Arc::new(AtomicUsize::new(0));
    {
        let sink = wheel_deltas.clone();
        element
            .events()
            .vertical_mouse_wheel_change
            .subscribe("t", move |args| {
                sink.fetch_add(args.delta as usize, Ordering::SeqCst);
            });
    }

    step(&context, &[TouchSample::new(Vec2::ZERO, 1, 1.0)]);
    let touch = context.touch_by_id(1).unwrap();
    touch.add_mouse_wheel(Vec2::new(0.0, 3.0));
    step(&context, &[TouchSample::new(Vec2::ZERO, 1, 1.0)]);

    assert_eq!(wheel_deltas.load(Ordering::SeqCst), 3);
}

#[test]
fn sub_context_receives_surface_touches() {
    let context = Context::new();
    let mut host = rect_at("host", 0.0);
    host.sub_context = Some(SubContextOptions::default());
    context.add_or_update_elements(true, [&host]);
    let host_element = context.roots()[0].clone();

    // An inner plane catches everything the host surface forwards.
    host_element
        .with_sub_context(|inner| {
            inner.add_or_update_elements(
                true,
                [&Prototype::with_shape("inner", ShapeKind::InfinitePlane)],
            );
        })
        .expect("host should carry a sub-context");

    run(&context, &[TouchSample::new(Vec2::new(0.2, 0.1), 9, 1.0)], 2);

    let inner_touched = host_element
        .with_sub_context(|inner| {
            let inner_element = inner.find("inner")[0].clone();
            (inner.touch_by_id(9).is_some(), inner_element.touched())
        })
        .unwrap();
    assert!(inner_touched.0, "outer id 9 exists inside");
    assert!(inner_touched.1, "the inner element is interacting");
}

#[test]
fn inactive_elements_are_skipped() {
    let context = Context::new();
    let mut proto = rect_at("panel", 0.0);
    proto.active = false;
    context.add_or_update_elements(true, [&proto]);
    let element = context.roots()[0].clone();

    step(&context, &[TouchSample::new(Vec2::ZERO, 1, 1.0)]);
    assert!(!element.hit());
    assert!(element.hovering().is_empty());
}

#[test]
fn serial_and_parallel_agree_on_a_frame() {
    let build = |parallel: bool| {
        let context = Context::with_options(ContextOptions {
            use_parallel: parallel,
            ..ContextOptions::default()
        });
        let glass = rect_at("glass", 0.5).transparent(true);
        let wall = rect_at("wall", 1.0);
        context.add_or_update_elements(true, [&glass, &wall]);
        let samples = [
            TouchSample::new(Vec2::ZERO, 1, 1.0),
            TouchSample::new(Vec2::new(0.2, 0.2), 2, 1.0),
        ];
        run(&context, &samples, 3);
        let snapshot = |name: &str| {
            let e = context.find(name)[0].clone();
            (e.hitting().len(), e.touching().len(), e.hit(), e.touched())
        };
        (snapshot("glass"), snapshot("wall"))
    };
    assert_eq!(build(false), build(true));
}
