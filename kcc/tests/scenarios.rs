use approx::assert_relative_eq;
use kcc::collision::{Iso, Vec3};
use kcc::{
    ActionInterface, CharacterController, CollisionObject, CollisionWorld, ConvexShape,
    KinematicCharacterController, QueryWorld,
};
use rapier3d::parry::shape::SharedShape;

const DT: f32 = 1.0 / 60.0;

/// Capsule center height when standing on the ground (half height + radius).
const STANDING_Y: f32 = 0.9;

fn cuboid(center: Vec3, half_extents: Vec3) -> CollisionObject {
    CollisionObject::new(
        SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
        Iso::translation(center.x, center.y, center.z),
    )
}

/// 40x40 slab whose top face is at y = 0.
fn ground() -> CollisionObject {
    cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(20.0, 0.5, 20.0))
}

/// World with the given obstacles and a capsule character at `start`.
fn setup(obstacles: Vec<CollisionObject>, start: Vec3) -> (QueryWorld, KinematicCharacterController) {
    let mut world = QueryWorld::new();
    for object in obstacles {
        world.insert_object(object).unwrap();
    }
    let shape = ConvexShape::capsule_y(0.5, 0.4);
    let ghost = world
        .add_ghost(
            &shape,
            Iso::translation(start.x, start.y, start.z),
            Default::default(),
        )
        .unwrap();
    let kcc = KinematicCharacterController::new(ghost, shape, 0.35);
    (world, kcc)
}

fn tick(world: &mut QueryWorld, kcc: &mut KinematicCharacterController) {
    kcc.update_action(world, DT);
    let state = kcc.state();
    assert!(
        state.vertical_velocity >= -kcc.fall_speed() && state.vertical_velocity <= kcc.jump_speed()
    );
    if kcc.on_ground() {
        assert_eq!(state.vertical_velocity, 0.0);
        assert_eq!(state.vertical_offset, 0.0);
    }
}

#[test]
fn walks_full_distance_on_flat_ground() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(1.0, 0.0, 0.0));
    tick(&mut world, &mut kcc);

    let p = kcc.position();
    assert_relative_eq!(p.x, 1.0, epsilon = 1.0e-3);
    assert_relative_eq!(p.y, STANDING_Y, epsilon = 1.0e-3);
    assert_relative_eq!(p.z, 0.0, epsilon = 1.0e-3);
    assert!(kcc.on_ground());
}

#[test]
fn very_slow_walk_still_advances() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(3.0e-4, 0.0, 0.0));
    for _ in 0..100 {
        tick(&mut world, &mut kcc);
    }
    assert_relative_eq!(kcc.position().x, 0.03, epsilon = 1.0e-4);
    assert_relative_eq!(kcc.position().y, STANDING_Y, epsilon = 1.0e-3);
}

#[test]
fn ghost_sweep_mode_walks_on_flat_ground() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_use_ghost_sweep_test(true);
    kcc.set_walk_direction(Vec3::new(0.0, 0.0, 0.1));
    for _ in 0..10 {
        tick(&mut world, &mut kcc);
    }
    assert_relative_eq!(kcc.position().z, 1.0, epsilon = 1.0e-3);
    assert_relative_eq!(kcc.position().y, STANDING_Y, epsilon = 1.0e-3);
    assert!(kcc.on_ground());
}

#[test]
fn climbs_ledge_lower_than_step_height() {
    let ledge = cuboid(Vec3::new(2.6, 0.1, 0.0), Vec3::new(2.0, 0.1, 2.0));
    let (mut world, mut kcc) = setup(vec![ground(), ledge], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(1.0, 0.0, 0.0));
    tick(&mut world, &mut kcc);

    let p = kcc.position();
    assert_relative_eq!(p.x, 1.0, epsilon = 1.0e-3);
    assert_relative_eq!(p.y, STANDING_Y + 0.2, epsilon = 1.0e-3);
    assert!(kcc.on_ground());
}

#[test]
fn blocked_by_ledge_higher_than_step_height() {
    let ledge = cuboid(Vec3::new(2.6, 0.5, 0.0), Vec3::new(2.0, 0.5, 2.0));
    let (mut world, mut kcc) = setup(vec![ground(), ledge], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(0.1, 0.0, 0.0));
    for _ in 0..20 {
        tick(&mut world, &mut kcc);
    }

    let p = kcc.position();
    assert!(p.x < 0.6 - 0.4 + 1.0e-3, "walked into the ledge: {p:?}");
    assert_relative_eq!(p.y, STANDING_Y, epsilon = 1.0e-3);
}

#[test]
fn small_drop_snaps_to_lower_floor() {
    let platform = cuboid(Vec3::new(-2.0, 0.1, 0.0), Vec3::new(2.0, 0.1, 2.0));
    let (mut world, mut kcc) =
        setup(vec![ground(), platform], Vec3::new(-0.5, STANDING_Y + 0.2, 0.0));
    kcc.set_walk_direction(Vec3::new(1.0, 0.0, 0.0));
    tick(&mut world, &mut kcc);

    let p = kcc.position();
    assert_relative_eq!(p.x, 0.5, epsilon = 1.0e-3);
    assert_relative_eq!(p.y, STANDING_Y, epsilon = 1.0e-3);
    assert!(kcc.on_ground());
    assert!(!kcc.state().full_drop);
}

#[test]
fn cliff_edge_leaves_character_airborne() {
    let cliff = cuboid(Vec3::new(-2.0, 2.5, 0.0), Vec3::new(2.0, 2.5, 2.0));
    let start_y = 5.0 + STANDING_Y;
    let (mut world, mut kcc) = setup(vec![ground(), cliff], Vec3::new(-0.5, start_y, 0.0));
    kcc.set_walk_direction(Vec3::new(1.0, 0.0, 0.0));
    tick(&mut world, &mut kcc);

    let p = kcc.position();
    assert!(!kcc.on_ground());
    assert!(kcc.state().full_drop);
    assert!(p.y < start_y && p.y > 5.0, "unexpected height {p:?}");

    // Keep falling until the ground catches the character.
    kcc.set_walk_direction(Vec3::zeros());
    for _ in 0..120 {
        tick(&mut world, &mut kcc);
    }
    assert!(kcc.on_ground());
    assert_relative_eq!(kcc.position().y, STANDING_Y, epsilon = 1.0e-2);
}

#[test]
fn slides_along_oblique_wall() {
    let wall = cuboid(Vec3::new(1.5, 2.0, 0.0), Vec3::new(0.5, 2.0, 5.0));
    let (mut world, mut kcc) = setup(vec![ground(), wall], Vec3::new(0.0, STANDING_Y, 0.0));
    let walk = Vec3::new(1.0, 0.0, 1.0);
    kcc.set_walk_direction(walk);
    tick(&mut world, &mut kcc);

    let p = kcc.position();
    assert_relative_eq!(p.x, 0.0, epsilon = 1.0e-3);
    assert_relative_eq!(p.z, 1.0, epsilon = 1.0e-3);
    let horizontal = Vec3::new(p.x, 0.0, p.z);
    assert!(horizontal.norm() <= walk.norm() + 1.0e-4);
}

#[test]
fn stops_at_wall_hit_head_on() {
    let wall = cuboid(Vec3::new(1.5, 2.0, 0.0), Vec3::new(0.5, 2.0, 5.0));
    let (mut world, mut kcc) = setup(vec![ground(), wall], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(1.0, 0.0, 0.0));
    for _ in 0..5 {
        tick(&mut world, &mut kcc);
        assert!(kcc.position().x < 1.0 - 0.4);
    }
    assert_relative_eq!(kcc.position().y, STANDING_Y, epsilon = 1.0e-3);
}

#[test]
fn fall_speed_is_never_exceeded() {
    let (mut world, mut kcc) = setup(vec![], Vec3::new(0.0, 100.0, 0.0));
    kcc.set_fall_speed(10.0);
    kcc.set_walk_direction(Vec3::zeros());

    let mut last_y = kcc.position().y;
    for _ in 0..60 {
        tick(&mut world, &mut kcc);
        assert!(kcc.state().vertical_velocity >= -10.0);
        assert!(kcc.position().y < last_y);
        last_y = kcc.position().y;
    }
    assert_relative_eq!(kcc.state().vertical_velocity, -10.0);
    assert!(!kcc.can_jump());
}

#[test]
fn jump_only_when_grounded() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::zeros());
    tick(&mut world, &mut kcc);
    assert!(kcc.can_jump());

    kcc.jump();
    assert_relative_eq!(kcc.state().vertical_velocity, kcc.jump_speed());
    tick(&mut world, &mut kcc);
    assert!(kcc.position().y > STANDING_Y);
    assert!(!kcc.can_jump());

    let airborne_velocity = kcc.state().vertical_velocity;
    kcc.jump();
    assert_eq!(kcc.state().vertical_velocity, airborne_velocity);

    for _ in 0..120 {
        tick(&mut world, &mut kcc);
    }
    assert!(kcc.on_ground());
    assert!(!kcc.state().was_jumping);
    assert_relative_eq!(kcc.position().y, STANDING_Y, epsilon = 1.0e-2);
}

#[test]
fn penetration_is_resolved_for_either_insertion_order() {
    for ghost_first in [false, true] {
        let shape = ConvexShape::capsule_y(0.5, 0.4);
        let mut world = QueryWorld::new();
        if !ghost_first {
            world.insert_object(ground()).unwrap();
        }
        let ghost = world
            .add_ghost(&shape, Iso::translation(0.0, 0.8, 0.0), Default::default())
            .unwrap();
        if ghost_first {
            world.insert_object(ground()).unwrap();
        }
        let mut kcc = KinematicCharacterController::new(ghost, shape, 0.35);

        kcc.pre_step(&mut world);
        let y = kcc.position().y;
        assert!(y > 0.85 && y < STANDING_Y, "order {ghost_first}: {y}");
        assert!(kcc.state().touching_contact);
        assert_relative_eq!(kcc.state().touching_normal, -Vec3::y(), epsilon = 1.0e-3);

        kcc.set_walk_direction(Vec3::zeros());
        kcc.player_step(&world, DT);
        assert_relative_eq!(kcc.position().y, STANDING_Y, epsilon = 1.0e-3);
    }
}

#[test]
fn warp_is_idempotent() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    let target = Vec3::new(3.0, STANDING_Y, -2.0);
    kcc.warp(target);
    let first = *kcc.ghost().world_transform();
    kcc.warp(target);
    assert_eq!(*kcc.ghost().world_transform(), first);

    kcc.set_walk_direction(Vec3::zeros());
    tick(&mut world, &mut kcc);
    assert_relative_eq!(kcc.position(), target, epsilon = 1.0e-3);
}

#[test]
fn reset_clears_motion_and_pair_cache() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(0.1, 0.0, 0.0));
    tick(&mut world, &mut kcc);
    kcc.jump();
    assert!(kcc.ghost().num_overlapping_objects() > 0);

    kcc.reset(&mut world);
    let state = kcc.state();
    assert_eq!(state.vertical_velocity, 0.0);
    assert_eq!(state.vertical_offset, 0.0);
    assert_eq!(state.walk_direction, Vec3::zeros());
    assert!(!state.was_jumping);
    assert!(!state.was_on_ground);
    assert_eq!(kcc.ghost().num_overlapping_objects(), 0);
}

#[test]
fn timed_velocity_moves_for_the_interval_only() {
    let (mut world, mut kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_velocity_for_time_interval(Vec3::new(2.0, 0.0, 0.0), 0.04);
    for _ in 0..3 {
        tick(&mut world, &mut kcc);
    }
    let after_interval = kcc.position();
    assert_relative_eq!(after_interval.x, 0.08, epsilon = 1.0e-3);

    tick(&mut world, &mut kcc);
    assert_relative_eq!(kcc.position(), after_interval, epsilon = 1.0e-5);
    assert!(kcc.state().velocity_time_interval <= 0.0);
}

#[test]
fn ground_probe_ignores_the_character() {
    let (world, kcc) = setup(vec![ground()], Vec3::new(0.0, STANDING_Y, 0.0));
    let result = kcc.ground_probe(&world, 5.0);
    let hit = result.hit.expect("ground below");
    assert_relative_eq!(hit.fraction * 5.0, STANDING_Y, epsilon = 1.0e-4);
    assert_relative_eq!(hit.normal, Vec3::y(), epsilon = 1.0e-4);
    assert_ne!(hit.object, kcc.ghost().handle());

    assert!(world.has_contact_response(hit.object));
}

#[test]
fn sensors_are_walked_through() {
    let sensor = cuboid(Vec3::new(1.5, 2.0, 0.0), Vec3::new(0.5, 2.0, 5.0)).with_contact_response(false);
    let (mut world, mut kcc) = setup(vec![ground(), sensor], Vec3::new(0.0, STANDING_Y, 0.0));
    kcc.set_walk_direction(Vec3::new(0.5, 0.0, 0.0));
    for _ in 0..4 {
        tick(&mut world, &mut kcc);
    }
    assert_relative_eq!(kcc.position().x, 2.0, epsilon = 1.0e-3);
}
