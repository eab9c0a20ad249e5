//! End-to-end execution against the simulated controller.

use std::time::Duration;

use image::{GrayImage, Luma};

use blockpick_config::ExecutionConfig;
use blockpick_core::{
    ActionSpec, Condition, LibraryRef, LocationSpec, MotionPattern, ObjectSpec, Pose, Program,
    ProgramNode, RunOutcome, SequenceStep,
};
use blockpick_driver::sim::SimProvider;
use blockpick_driver::{Endpoint, RobotSession};
use blockpick_runtime::{
    search_object, ExecutionRequest, ProgramExecutor, SearchContext, SearchCursor,
};
use blockpick_stores::InMemoryLibrary;
use blockpick_vision::{extract_silhouette, StaticFrameSource};

const FRAME: u32 = 200;

fn test_config() -> ExecutionConfig {
    let mut config = ExecutionConfig::default();
    config.calibration.frame_width = FRAME;
    config.calibration.frame_height = FRAME;
    config.matcher.area_tolerance = 2_000.0;
    config.matcher.smooth_window = 3;
    config
}

/// Light work surface with a dark rectangle on it.
fn frame_with_rect(x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
    let mut frame = GrayImage::from_pixel(FRAME, FRAME, Luma([230u8]));
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            frame.put_pixel(x, y, Luma([20u8]));
        }
    }
    frame
}

fn cube_frame() -> GrayImage {
    frame_with_rect(70, 70, 60, 60)
}

fn bar_frame() -> GrayImage {
    frame_with_rect(30, 100, 80, 24)
}

/// Nothing pickable: only a speck of noise.
fn speck_frame() -> GrayImage {
    frame_with_rect(3, 3, 4, 4)
}

fn silhouette_png(frame: &GrayImage, config: &ExecutionConfig) -> Vec<u8> {
    extract_silhouette(frame, &config.matcher)
        .expect("silhouette")
        .to_png()
        .expect("png")
}

fn cube_object(config: &ExecutionConfig) -> ObjectSpec {
    ObjectSpec {
        reference: LibraryRef::resolved(1, "cube"),
        shape_png: silhouette_png(&cube_frame(), config),
        height_mm: 91.0,
        grip_force: 2.0,
    }
}

fn bar_object(config: &ExecutionConfig) -> ObjectSpec {
    ObjectSpec {
        reference: LibraryRef::resolved(4, "bar"),
        shape_png: silhouette_png(&bar_frame(), config),
        height_mm: 88.0,
        grip_force: 1.5,
    }
}

fn bin_pose() -> Pose {
    Pose::new(150.0, 80.0, 120.0, 180.0, 0.0, 180.0, 261.0)
}

fn tray_pose() -> Pose {
    Pose::new(10.0, 180.0, 120.0, 180.0, 0.0, 180.0, 261.0)
}

fn library(config: &ExecutionConfig) -> InMemoryLibrary {
    InMemoryLibrary::new()
        .with_object(cube_object(config))
        .with_object(bar_object(config))
        .with_action(ActionSpec {
            reference: LibraryRef::resolved(2, "shake"),
            pattern: MotionPattern::Custom,
            points: vec![
                Pose::new(160.0, 0.0, 200.0, 180.0, 0.0, 180.0, 261.0),
                Pose::new(160.0, 40.0, 200.0, 180.0, 0.0, 180.0, 261.0),
            ],
        })
        .with_location(LocationSpec {
            reference: LibraryRef::resolved(3, "bin"),
            pose: bin_pose(),
        })
        .with_location(LocationSpec {
            reference: LibraryRef::resolved(5, "tray"),
            pose: tray_pose(),
        })
}

fn pick_place(object: LibraryRef, location: LibraryRef) -> SequenceStep {
    SequenceStep::Pick {
        object,
        next: Some(Box::new(SequenceStep::Place { location })),
    }
}

fn cube_to_bin() -> SequenceStep {
    pick_place(
        LibraryRef::resolved(1, "cube"),
        LibraryRef::resolved(3, "bin"),
    )
}

fn executor(
    frames: Vec<GrayImage>,
) -> ProgramExecutor<SimProvider, StaticFrameSource, InMemoryLibrary> {
    let config = test_config();
    ProgramExecutor::new(
        SimProvider::new(),
        StaticFrameSource::new(frames, (FRAME, FRAME)),
        library(&config),
        config,
    )
}

#[test]
fn repeat_places_once_per_iteration() {
    tokio_test::block_on(async {
        let mut executor = executor(vec![cube_frame(), cube_frame(), cube_frame()]);
        let program = Program::new(
            "t-repeat",
            ProgramNode::Repeat {
                times: 3,
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.searches, 3);
        assert_eq!(report.placements, 3);

        let state = executor.provider().world().snapshot();
        assert_eq!(state.connects, 1);
        assert_eq!(state.disconnects, 1);
        assert_eq!(state.arm_owner, None);
        // Grip force is the object force scaled by the gripper config.
        assert_eq!(state.last_close_force, Some(12.0));
        assert_eq!(state.pose, bin_pose());
    });
}

#[test]
fn repeat_aborts_on_first_failed_search() {
    tokio_test::block_on(async {
        // First iteration finds the cube; the second scans a full empty ring.
        let mut frames = vec![cube_frame()];
        frames.extend(std::iter::repeat_with(speck_frame).take(6));
        let mut executor = executor(frames);
        let program = Program::new(
            "t-repeat-fail",
            ProgramNode::Repeat {
                times: 3,
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::ObjectNotFound);
        assert_eq!(report.searches, 2);
        // The completed placement stands.
        assert_eq!(report.placements, 1);
        assert_eq!(executor.frames().captures(), 7);

        let state = executor.provider().world().snapshot();
        assert_eq!(state.disconnects, 1);
        assert_eq!(state.arm_owner, None);
    });
}

#[test]
fn loop_runs_until_a_search_fails() {
    tokio_test::block_on(async {
        let mut frames = vec![cube_frame(), cube_frame()];
        frames.extend(std::iter::repeat_with(speck_frame).take(6));
        let mut executor = executor(frames);
        let program = Program::new(
            "t-loop",
            ProgramNode::Loop {
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        // A loop only ever ends on a failed search.
        assert_eq!(report.outcome, RunOutcome::ObjectNotFound);
        assert_eq!(report.placements, 2);
        assert_eq!(report.searches, 3);
    });
}

#[test]
fn malformed_program_touches_no_hardware() {
    tokio_test::block_on(async {
        let mut executor = executor(vec![]);
        let program = Program::new(
            "t-malformed",
            ProgramNode::Sequence {
                chain: pick_place(
                    LibraryRef::unresolved("ghost"),
                    LibraryRef::resolved(3, "bin"),
                ),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::MalformedProgram);
        assert_eq!(report.searches, 0);
        assert_eq!(executor.provider().opened(), 0);
        assert_eq!(executor.frames().captures(), 0);
    });
}

#[test]
fn unknown_library_record_is_malformed() {
    tokio_test::block_on(async {
        let mut executor = executor(vec![]);
        let program = Program::new(
            "t-unknown",
            ProgramNode::Sequence {
                chain: pick_place(
                    LibraryRef::resolved(99, "phantom"),
                    LibraryRef::resolved(3, "bin"),
                ),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::MalformedProgram);
        assert!(report.detail.unwrap().contains("not found"));
        assert_eq!(executor.provider().opened(), 0);
    });
}

#[test]
fn when_with_false_sensor_reports_condition_not_met() {
    tokio_test::block_on(async {
        let mut executor = executor(vec![cube_frame()]);
        let program = Program::new(
            "t-when-false",
            ProgramNode::When {
                condition: Condition::Sensor,
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program).with_acknowledge(false))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::ConditionNotMet);
        assert_eq!(report.searches, 0);
        assert_eq!(report.placements, 0);

        // Nothing moved beyond the initial home/open prologue.
        let commands = executor.provider().world().commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("move ptp"));
        assert!(commands[1].starts_with("open_hand 30 25"));
        assert_eq!(executor.frames().captures(), 0);
        assert_eq!(executor.provider().world().snapshot().disconnects, 1);
    });
}

#[test]
fn when_with_true_sensor_runs_body_once() {
    tokio_test::block_on(async {
        let mut executor = executor(vec![cube_frame()]);
        let program = Program::new(
            "t-when-true",
            ProgramNode::When {
                condition: Condition::Human,
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program).with_acknowledge(true))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.searches, 1);
        assert_eq!(report.placements, 1);
    });
}

#[test]
fn when_otherwise_runs_only_the_otherwise_branch() {
    tokio_test::block_on(async {
        // The frame shows the bar, which only the otherwise branch picks.
        let mut executor = executor(vec![bar_frame()]);
        let program = Program::new(
            "t-otherwise",
            ProgramNode::WhenOtherwise {
                condition: Condition::Sensor,
                body: cube_to_bin(),
                otherwise: pick_place(
                    LibraryRef::resolved(4, "bar"),
                    LibraryRef::resolved(5, "tray"),
                ),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program).with_acknowledge(false))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        // Exactly one search and one placement: the primary body never ran.
        assert_eq!(report.searches, 1);
        assert_eq!(report.placements, 1);

        let state = executor.provider().world().snapshot();
        assert_eq!(state.pose, tray_pose());
        assert_eq!(state.last_close_force, Some(9.0));
    });
}

#[test]
fn when_otherwise_failed_fallback_search_is_object_not_found() {
    tokio_test::block_on(async {
        let mut executor = executor(std::iter::repeat_with(speck_frame).take(6).collect());
        let program = Program::new(
            "t-otherwise-missing",
            ProgramNode::WhenOtherwise {
                condition: Condition::Sensor,
                body: cube_to_bin(),
                otherwise: pick_place(
                    LibraryRef::resolved(4, "bar"),
                    LibraryRef::resolved(5, "tray"),
                ),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program).with_acknowledge(false))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::ObjectNotFound);
        assert_eq!(report.placements, 0);
    });
}

#[test]
fn find_condition_searches_independently_of_the_pick() {
    tokio_test::block_on(async {
        // One frame for the presence check, one for the body's own search.
        let mut executor = executor(vec![cube_frame(), cube_frame()]);
        let program = Program::new(
            "t-find",
            ProgramNode::When {
                condition: Condition::Find {
                    object: LibraryRef::resolved(1, "cube"),
                },
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.searches, 2);
        assert_eq!(report.placements, 1);

        let commands = executor.provider().world().commands();
        let closes = commands.iter().filter(|c| c.starts_with("close_hand")).count();
        assert_eq!(closes, 2);
    });
}

#[test]
fn search_resumes_near_the_last_success() {
    tokio_test::block_on(async {
        // First scan walks quadrants 0 and 1 empty and matches at 2; the
        // second scan starts at quadrant 2 and matches immediately.
        let frames = vec![speck_frame(), speck_frame(), cube_frame(), cube_frame()];
        let mut executor = executor(frames);
        let program = Program::new(
            "t-cursor",
            ProgramNode::Repeat {
                times: 2,
                body: cube_to_bin(),
            },
        );

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);
        assert_eq!(report.placements, 2);
        assert_eq!(executor.frames().captures(), 4);
    });
}

#[test]
fn sequence_plays_action_points_between_lift_and_place() {
    tokio_test::block_on(async {
        let mut executor = executor(vec![cube_frame()]);
        let chain = SequenceStep::Pick {
            object: LibraryRef::resolved(1, "cube"),
            next: Some(Box::new(SequenceStep::Processing {
                action: LibraryRef::resolved(2, "shake"),
                next: Some(Box::new(SequenceStep::Place {
                    location: LibraryRef::resolved(3, "bin"),
                })),
            })),
        };
        let program = Program::new("t-action", ProgramNode::Sequence { chain });

        let report = executor
            .execute(&ExecutionRequest::new(program))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Success);

        let commands = executor.provider().world().commands();
        // Descend and lift run as half-speed linear moves.
        assert!(commands
            .iter()
            .any(|c| c.starts_with("move lin") && c.ends_with("SPEED=50")));
        let first_action = commands
            .iter()
            .position(|c| c.contains("P(160, 0, 200"))
            .expect("first action point played");
        let place = commands
            .iter()
            .position(|c| c.contains("P(150, 80, 120"))
            .expect("place move present");
        assert!(first_action < place);
    });
}

#[test]
fn exhausted_ring_leaves_the_cursor_unchanged() {
    tokio_test::block_on(async {
        let provider = SimProvider::new();
        let endpoint = Endpoint::new("sim", 0, Duration::from_secs(1));
        let mut session = RobotSession::connect(&provider, &endpoint).await.unwrap();

        let config = test_config();
        let geometry = config.calibration.geometry();
        let ring = config.calibration.ring().unwrap();
        let ctx = SearchContext {
            calibration: &geometry,
            ring: &ring,
            matcher: &config.matcher,
            gripper: &config.gripper,
        };
        let mut frames = StaticFrameSource::new(
            std::iter::repeat_with(speck_frame).take(6).collect(),
            (FRAME, FRAME),
        );

        let outcome = search_object(
            &mut session,
            &mut frames,
            &ctx,
            &cube_object(&config),
            SearchCursor(2),
        )
        .await
        .unwrap();

        assert!(!outcome.found);
        assert_eq!(outcome.cursor, SearchCursor(2));
        // One full ring, no more.
        assert_eq!(frames.captures(), 6);
        session.disconnect().await.unwrap();
    });
}
