//! End-to-end scenarios driving the occupancy engine and the RRT planner
//! together against simulated worlds with rectangular obstacles.

use horus_slam::datapoint::{Observation, ObservationType};
use horus_slam::geometry::{Point, Pose};
use horus_slam::planner::rrt::{RrtConfig, RrtPlanner};
use horus_slam::world::ObservedWorld;
use std::sync::atomic::AtomicBool;

/// Observes the four corners plus the full boundary of an obstacle
/// rectangle as free space, and the rectangle's own cells as obstacles, so
/// `ObservedWorld` has a believable belief to plan against.
fn world_with_rect_obstacle(size: f64, rect: (f64, f64, f64, f64)) -> ObservedWorld {
    let mut world = ObservedWorld::new();
    let pose = Pose::new(0.0, 0.0, 0.0);

    for corner in [
        Point::new(0.0, 0.0),
        Point::new(size, 0.0),
        Point::new(0.0, size),
        Point::new(size, size),
    ] {
        world.add_observation(&pose, Observation::new(corner, ObservationType::Free));
    }

    let (x_min, x_max, y_min, y_max) = rect;
    let mut x = x_min;
    while x <= x_max {
        let mut y = y_min;
        while y <= y_max {
            world.add_observation(
                &pose,
                Observation::new(Point::new(x, y), ObservationType::Obstacle),
            );
            y += 1.0;
        }
        x += 1.0;
    }

    world
}

#[test]
fn empty_world_planner_returns_in_bounds_hop() {
    let mut world = ObservedWorld::new();
    let pose = Pose::new(0.0, 0.0, 0.0);
    for corner in [
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(0.0, 50.0),
        Point::new(50.0, 50.0),
    ] {
        world.add_observation(&pose, Observation::new(corner, ObservationType::Free));
    }
    world.predict_world(1.0).unwrap();

    let planner = RrtPlanner::new(RrtConfig::default());
    let shutdown = AtomicBool::new(false);
    let start = Point::new(5.0, 5.0);
    let goal = Point::new(45.0, 45.0);

    let (hop, _) = planner.plan_next_step(&world, start, goal, &shutdown);
    let hop = hop.expect("empty 50x50 world should always yield a hop");
    assert!(hop.x >= 0.0 && hop.x <= 50.0);
    assert!(hop.y >= 0.0 && hop.y <= 50.0);
}

#[test]
fn corridor_world_never_places_a_waypoint_inside_the_obstacle() {
    let mut world = world_with_rect_obstacle(40.0, (0.0, 10.0, 20.0, 39.0));
    world.predict_world(1.0).unwrap();

    let planner = RrtPlanner::new(RrtConfig {
        robot_size: 4.0,
        ..RrtConfig::default()
    });
    let shutdown = AtomicBool::new(false);
    let start = Point::new(5.0, 5.0);
    let goal = Point::new(35.0, 35.0);

    for _ in 0..10 {
        let (hop, _) = planner.plan_next_step(&world, start, goal, &shutdown);
        if let Some(hop) = hop {
            let inside_obstacle = hop.x >= 0.0 && hop.x <= 10.0 && hop.y >= 20.0 && hop.y <= 39.0;
            assert!(!inside_obstacle, "waypoint {hop:?} landed inside the corridor obstacle");
        }
    }
}

/// Scenario 3: enclosed room (w=50,h=50, obstacle [20,30]x[20,30]), start
/// (40,40,180°). Once the area around the robot's final pose has been
/// densely observed, `perc_unknown_surround` must read low (< 0.3) for
/// every in-bounds cell within `robot_size` of that pose.
#[test]
fn enclosed_room_surround_is_mostly_known_near_the_final_pose() {
    let mut world = ObservedWorld::new();
    let pose = Pose::new(40.0, 40.0, 180.0);

    for corner in [
        Point::new(0.0, 0.0),
        Point::new(50.0, 0.0),
        Point::new(0.0, 50.0),
        Point::new(50.0, 50.0),
    ] {
        world.add_observation(&pose, Observation::new(corner, ObservationType::Free));
    }

    let mut x = 20.0;
    while x <= 30.0 {
        let mut y = 20.0;
        while y <= 30.0 {
            world.add_observation(&pose, Observation::new(Point::new(x, y), ObservationType::Obstacle));
            y += 1.0;
        }
        x += 1.0;
    }

    // Dense free coverage around the robot's final corner of the room, as
    // if the sensor fan had swept that whole quadrant before exploration
    // terminated there.
    let mut x = 30.0;
    while x <= 50.0 {
        let mut y = 30.0;
        while y <= 50.0 {
            world.add_observation(&pose, Observation::new(Point::new(x, y), ObservationType::Free));
            y += 2.0;
        }
        x += 2.0;
    }

    world.predict_world(1.0).unwrap();

    let robot_size = 10.0;
    let radius = (robot_size / 2.0).floor() as i64;
    let center = pose.position();

    let mut checked = 0;
    let mut x = center.x - robot_size;
    while x <= center.x + robot_size {
        let mut y = center.y - robot_size;
        while y <= center.y + robot_size {
            let cell = Point::new(x, y);
            if world.point_in_bounds(&cell) {
                assert!(
                    world.perc_unknown_surround(&cell, radius) < 0.3,
                    "cell {cell:?} near the robot's final pose is still mostly unknown"
                );
                checked += 1;
            }
            y += 1.0;
        }
        x += 1.0;
    }
    assert!(checked > 0, "test did not actually check any in-bounds cells");
}

#[test]
fn two_box_world_reaches_goal_through_the_gap_within_node_budget() {
    let mut world = world_with_rect_obstacle(50.0, (0.0, 20.0, 20.0, 35.0));
    for x in 40..=49 {
        for y in 0..=15 {
            world.add_observation(
                &Pose::new(0.0, 0.0, 0.0),
                Observation::new(Point::new(x as f64, y as f64), ObservationType::Obstacle),
            );
        }
    }
    world.predict_world(1.0).unwrap();

    let planner = RrtPlanner::new(RrtConfig {
        robot_size: 4.0,
        tolerance: 5.0,
        ..RrtConfig::default()
    });
    let shutdown = AtomicBool::new(false);
    let start = Point::new(5.0, 5.0);
    let goal = Point::new(45.0, 40.0);

    let (hop, _) = planner.plan_next_step(&world, start, goal, &shutdown);
    assert!(hop.is_some(), "planner should find a hop through the gap between the two boxes");
}

#[test]
fn tight_gap_world_never_exits_map_bounds() {
    let mut world = ObservedWorld::new();
    let pose = Pose::new(0.0, 0.0, 0.0);
    for corner in [
        Point::new(0.0, 0.0),
        Point::new(60.0, 0.0),
        Point::new(0.0, 20.0),
        Point::new(60.0, 20.0),
    ] {
        world.add_observation(&pose, Observation::new(corner, ObservationType::Free));
    }
    let mut x = 20.0;
    while x <= 30.0 {
        let mut y = 0.0;
        while y <= 5.0 {
            world.add_observation(&pose, Observation::new(Point::new(x, y), ObservationType::Obstacle));
            y += 1.0;
        }
        x += 1.0;
    }
    world.predict_world(1.0).unwrap();

    let planner = RrtPlanner::new(RrtConfig {
        robot_size: 6.0,
        ..RrtConfig::default()
    });
    let shutdown = AtomicBool::new(false);
    let start = Point::new(5.0, 10.0);
    let goal = Point::new(55.0, 10.0);

    for _ in 0..5 {
        let (hop, _) = planner.plan_next_step(&world, start, goal, &shutdown);
        if let Some(hop) = hop {
            assert!(hop.x >= 0.0 && hop.x <= 60.0);
            assert!(hop.y >= 0.0 && hop.y <= 20.0);
        }
    }
}
