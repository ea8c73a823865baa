//! Integration tests: drive whole sessions through the async runner
//! against a scripted collaborator.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod support;

use std::cell::RefCell;

use futures::executor::block_on;
use kicklens_pipeline::{
    Action, Command, Commit, MissingArtifact, PipelineController, PipelineError, PipelineStage,
    Quadrant, QuadrantVisualizer, RecordId, SequenceKind, SourceFile, StatusKind, run,
};
use support::StubCollaborator;

fn selected() -> RefCell<PipelineController> {
    let mut controller = PipelineController::new();
    controller.select_file(SourceFile::new("penalty.mp4", vec![0_u8; 64]));
    RefCell::new(controller)
}

fn run_all(
    controller: &RefCell<PipelineController>,
    stub: &StubCollaborator,
    commands: &[Command],
) {
    for command in commands {
        block_on(run(controller, stub, *command)).expect("command should succeed");
    }
}

const FORWARD: [Command; 4] = [
    Command::Upload,
    Command::ExtractFrames { timestamp: 1.25 },
    Command::DetectPose,
    Command::PredictDirection,
];

#[test]
fn forward_run_renders_prediction() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &FORWARD);

    let c = controller.borrow();
    assert_eq!(c.stage(), PipelineStage::DirectionPredicted);
    assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
    assert_eq!(c.stored_filename(), Some("penalty.mp4"));
    assert_eq!(c.status().unwrap().message, "Prediction complete");

    let grid = QuadrantVisualizer::default().render(c.probabilities().unwrap());
    assert_eq!(grid.dominant, Some(Quadrant::BottomRight));
    assert!((grid.cell(Quadrant::BottomRight).intensity - 0.6).abs() < 1e-12);
    assert!((grid.cell(Quadrant::TopLeft).intensity - 0.28).abs() < 1e-12);

    for action in Action::ALL {
        assert_eq!(stub.calls(action), 1, "{action} should be called once");
    }
}

#[test]
fn detect_without_frames_issues_no_call() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &[Command::Upload]);

    let err = block_on(run(&controller, &stub, Command::DetectPose)).unwrap_err();
    assert_eq!(
        err,
        PipelineError::PreconditionNotMet {
            action: Action::Detect,
            missing: MissingArtifact::Frames,
        }
    );
    assert_eq!(stub.calls(Action::Detect), 0);
    assert_eq!(stub.total_calls(), 1);
}

#[test]
fn nothing_runs_before_upload() {
    let controller = RefCell::new(PipelineController::new());
    let stub = StubCollaborator::new();
    for command in FORWARD {
        assert!(matches!(
            block_on(run(&controller, &stub, command)),
            Err(PipelineError::PreconditionNotMet { .. })
        ));
    }
    assert_eq!(stub.total_calls(), 0);
    assert_eq!(controller.borrow().stage(), PipelineStage::Idle);
}

#[test]
fn upload_resets_a_finished_session() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &FORWARD);
    let epoch = controller.borrow().epoch();

    controller
        .borrow_mut()
        .select_file(SourceFile::new("second.mov", vec![1_u8; 8]));
    run_all(&controller, &stub, &[Command::Upload]);

    let c = controller.borrow();
    assert_eq!(c.stage(), PipelineStage::Uploaded);
    assert!(c.epoch() > epoch);
    assert_eq!(c.stored_filename(), Some("second.mov"));
    assert!(c.sequence(SequenceKind::Frames).is_empty());
    assert!(c.sequence(SequenceKind::AnnotatedFrames).is_empty());
    assert!(c.probabilities().is_none());
}

#[test]
fn second_extraction_replaces_the_first() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &FORWARD);
    run_all(
        &controller,
        &stub,
        &[Command::ExtractFrames { timestamp: 4.0 }],
    );

    let c = controller.borrow();
    assert_eq!(c.stage(), PipelineStage::FramesExtracted);
    let frames = c.sequence(SequenceKind::Frames);
    assert!(frames.iter().all(|a| a.url().contains("/call2/")));
    assert!(frames.iter().all(|a| a.epoch() == c.epoch()));
    assert!(c.sequence(SequenceKind::AnnotatedFrames).is_empty());
    assert!(c.probabilities().is_none());
    assert_eq!(c.kick_id(), Some(&RecordId::Number(2)));
}

#[test]
fn rendered_urls_change_with_each_extraction() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &FORWARD[..2]);
    let first = controller
        .borrow()
        .navigator(SequenceKind::Frames)
        .current_artifact()
        .unwrap()
        .render_url("http://localhost:8098");

    run_all(&controller, &stub, &FORWARD[1..2]);
    let second = controller
        .borrow()
        .navigator(SequenceKind::Frames)
        .current_artifact()
        .unwrap()
        .render_url("http://localhost:8098");

    assert_ne!(first, second);
    assert!(second.starts_with("http://localhost:8098/api/temp_frames/"));
}

#[test]
fn extract_while_extracting_is_busy() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &[Command::Upload]);

    let release = stub.hold_next_extract();
    let (controller_ref, stub_ref) = (&controller, &stub);
    let first = run(controller_ref, stub_ref, Command::ExtractFrames { timestamp: 1.0 });
    let second = async move {
        let result = run(controller_ref, stub_ref, Command::ExtractFrames { timestamp: 2.0 }).await;
        release.send(()).unwrap();
        result
    };
    let (first, second) = block_on(async { futures::join!(first, second) });

    assert_eq!(first.unwrap(), Commit::Applied(PipelineStage::FramesExtracted));
    assert_eq!(
        second.unwrap_err(),
        PipelineError::PipelineBusy {
            requested: Action::Extract,
            pending: Action::Extract,
        }
    );
    assert_eq!(stub.calls(Action::Extract), 1);
    assert!(!controller.borrow().is_busy());
}

#[test]
fn upload_supersedes_pending_extraction() {
    let controller = selected();
    let stub = StubCollaborator::new();
    run_all(&controller, &stub, &FORWARD);

    let release = stub.hold_next_extract();
    let (controller_ref, stub_ref) = (&controller, &stub);
    let extract = run(controller_ref, stub_ref, Command::ExtractFrames { timestamp: 9.0 });
    let upload = async move {
        let result = run(controller_ref, stub_ref, Command::Upload).await;
        release.send(()).unwrap();
        result
    };
    let (extract, upload) = block_on(async { futures::join!(extract, upload) });

    assert_eq!(upload.unwrap(), Commit::Applied(PipelineStage::Uploaded));
    assert_eq!(extract.unwrap(), Commit::Discarded);

    let c = controller.borrow();
    assert_eq!(c.stage(), PipelineStage::Uploaded);
    assert!(c.sequence(SequenceKind::Frames).is_empty());
    assert!(!c.is_busy());
}

#[test]
fn remote_failure_is_recoverable() {
    let controller = selected();
    let stub = StubCollaborator::new().failing(Action::Detect);
    run_all(&controller, &stub, &FORWARD[..2]);
    let epoch = controller.borrow().epoch();

    let err = block_on(run(&controller, &stub, Command::DetectPose)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::RemoteActionFailed {
            action: Action::Detect,
            ..
        }
    ));

    let c = controller.borrow();
    assert_eq!(c.stage(), PipelineStage::FramesExtracted);
    assert_eq!(c.epoch(), epoch);
    assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
    assert!(!c.is_busy());
    let status = c.status().unwrap();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.message.contains("stub failure"));
}

#[test]
fn upload_failure_keeps_finished_session() {
    let controller = selected();
    run_all(&controller, &StubCollaborator::new(), &FORWARD);
    let (epoch, first_frame) = {
        let c = controller.borrow();
        (c.epoch(), c.sequence(SequenceKind::Frames).get(0).cloned())
    };

    let failing = StubCollaborator::new().failing(Action::Upload);
    let err = block_on(run(&controller, &failing, Command::Upload)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::RemoteActionFailed {
            action: Action::Upload,
            ..
        }
    ));
    assert_eq!(failing.calls(Action::Upload), 1);

    let c = controller.borrow();
    assert_eq!(c.stage(), PipelineStage::DirectionPredicted);
    assert_eq!(c.epoch(), epoch);
    assert_eq!(c.stored_filename(), Some("penalty.mp4"));
    assert_eq!(c.sequence(SequenceKind::Frames).len(), 21);
    assert_eq!(c.sequence(SequenceKind::Frames).get(0).cloned(), first_frame);
    assert_eq!(c.sequence(SequenceKind::AnnotatedFrames).len(), 21);
    assert!(c.probabilities().is_some());
    assert_eq!(c.status().unwrap().kind, StatusKind::Error);
    assert!(!c.is_busy());
}

#[test]
fn short_probability_vector_is_malformed() {
    let controller = selected();
    let stub = StubCollaborator::new().with_probs(vec![0.2; 5]);
    run_all(&controller, &stub, &FORWARD[..3]);

    let err = block_on(run(&controller, &stub, Command::PredictDirection)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::MalformedResponse {
            action: Action::Predict,
            ..
        }
    ));
    assert_eq!(controller.borrow().stage(), PipelineStage::PoseDetected);
    assert!(controller.borrow().probabilities().is_none());
}

#[test]
fn empty_extraction_blocks_detection() {
    let controller = selected();
    let stub = StubCollaborator::new().with_frames(0);
    run_all(&controller, &stub, &FORWARD[..2]);

    assert_eq!(
        controller.borrow().stage(),
        PipelineStage::FramesExtracted
    );
    assert!(!controller.borrow().can(Action::Detect));
    assert!(block_on(run(&controller, &stub, Command::DetectPose)).is_err());
    assert_eq!(stub.calls(Action::Detect), 0);
}
