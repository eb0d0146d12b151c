//! Per-frame loop: capture, extract, classify, dispatch, render, present.

use anyhow::Result;

use crate::{
    config::AppConfig,
    display::Viewport,
    gesture::GestureClassifier,
    interaction::{Command, ModeMachine, Transition},
    pipeline::{CommandQueue, FrameSource, LandmarkExtractor},
    render::{HudState, Renderer, RgbaCanvas, skeleton},
    scene::SceneGraph,
    types::{Frame, GestureEvent, GestureKind, RunFlag},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Quit,
}

/// Everything the main thread owns. Geometric state is only touched here.
pub struct Session {
    classifier: GestureClassifier,
    machine: ModeMachine,
    scene: SceneGraph,
    renderer: Renderer,
    commands: CommandQueue,
    last_gesture: GestureKind,
    draw_skeleton: bool,
    frames: u64,
}

impl Session {
    pub fn new(config: &AppConfig, scene: SceneGraph, commands: CommandQueue) -> Self {
        Self {
            classifier: GestureClassifier::new(config.gesture.clone()),
            machine: ModeMachine::new(),
            scene,
            renderer: Renderer::new(config.render.clone()),
            commands,
            last_gesture: GestureKind::None,
            draw_skeleton: config.render.draw_skeleton,
            frames: 0,
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn machine(&self) -> &ModeMachine {
        &self.machine
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Runs one frame through the pipeline and draws the overlay into it.
    pub fn step(&mut self, frame: &mut Frame, extractor: &mut dyn LandmarkExtractor) -> StepOutcome {
        self.frames += 1;
        self.scene.set_viewport(frame.width, frame.height);

        let hands = extractor.extract(frame).unwrap_or_else(|err| {
            log::warn!("{} extractor failed: {err:?}", extractor.name());
            Vec::new()
        });

        let event = self.classifier.classify(&hands);
        if event != GestureEvent::None {
            if event.kind() != self.last_gesture {
                log::debug!("frame {}: {}", self.frames, event.display_text());
            }
            self.last_gesture = event.kind();
        }
        if let Some(node) = self.machine.dispatch(&event, &mut self.scene) {
            log::debug!("frame {}: dragged node {}", self.frames, node.0);
        }

        let mut outcome = StepOutcome::Continue;
        for command in self.commands.drain() {
            if self.apply(command) == StepOutcome::Quit {
                outcome = StepOutcome::Quit;
            }
        }

        let mut canvas = RgbaCanvas::new(frame);
        self.renderer.render(
            &mut canvas,
            &self.scene,
            HudState {
                mode: self.machine.mode(),
                last_gesture: self.last_gesture,
            },
        );
        if self.draw_skeleton {
            skeleton::draw_hands(&mut canvas, &hands);
        }
        outcome
    }

    pub fn apply(&mut self, command: Command) -> StepOutcome {
        match self.machine.apply_command(command, &mut self.scene) {
            Transition::Quit => StepOutcome::Quit,
            Transition::Changed(_) | Transition::Unchanged | Transition::Reset => {
                StepOutcome::Continue
            }
        }
    }
}

/// Drives `session` until the viewport closes, a quit command arrives,
/// `running` is cleared, or the frame or landmark source runs dry.
pub fn run_loop(
    session: &mut Session,
    frames: &mut dyn FrameSource,
    extractor: &mut dyn LandmarkExtractor,
    viewport: &mut dyn Viewport,
    running: &RunFlag,
) -> Result<()> {
    log::info!("starting loop with {} extractor", extractor.name());
    while running.is_running() && viewport.is_open() && !extractor.exhausted() {
        let Some(mut frame) = frames.next_frame() else {
            break;
        };
        let mut outcome = session.step(&mut frame, extractor);
        viewport.present(&frame)?;

        for key in viewport.poll_keys() {
            if let Some(command) = Command::from_key(&key) {
                if session.apply(command) == StepOutcome::Quit {
                    outcome = StepOutcome::Quit;
                }
            }
        }
        if outcome == StepOutcome::Quit {
            running.stop();
        }
    }
    log::info!("loop finished after {} frames", session.frames());
    viewport.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        display::HeadlessViewport,
        gesture::tests::{fist_hand, open_hand, pinching_hand},
        interaction::Mode,
        pipeline::{BlankFrames, ReplayExtractor},
        scene::NodeId,
        types::HandKeypoints,
    };
    use anyhow::anyhow;

    struct Failing;

    impl LandmarkExtractor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn extract(&mut self, _frame: &Frame) -> Result<Vec<HandKeypoints>> {
            Err(anyhow!("model crashed"))
        }
    }

    fn session() -> (crossbeam_channel::Sender<Command>, Session) {
        let config = AppConfig::default();
        let (tx, queue) = CommandQueue::new();
        (tx, Session::new(&config, SceneGraph::sample(&config), queue))
    }

    fn blank() -> Frame {
        Frame::solid(640, 480, [0, 0, 0, 255])
    }

    #[test]
    fn fist_motion_rotates_in_default_mode() {
        let (_tx, mut s) = session();
        let mut replay = ReplayExtractor::from_frames(vec![
            vec![fist_hand(0.5, 0.5)],
            vec![fist_hand(0.6, 0.5)],
        ]);
        s.step(&mut blank(), &mut replay);
        s.step(&mut blank(), &mut replay);
        assert!((s.scene().camera().yaw() - 0.1 * 2.0 * 0.01).abs() < 1e-5);
    }

    #[test]
    fn queued_commands_apply_before_next_frame_renders() {
        let (tx, mut s) = session();
        tx.send(Command::SetMode(Mode::Drag)).unwrap();
        tx.send(Command::SetMode(Mode::Zoom)).unwrap();
        let mut idle = ReplayExtractor::from_frames(vec![]);
        assert_eq!(s.step(&mut blank(), &mut idle), StepOutcome::Continue);
        assert_eq!(s.machine().mode(), Mode::Zoom);

        tx.send(Command::Quit).unwrap();
        assert_eq!(s.step(&mut blank(), &mut idle), StepOutcome::Quit);
    }

    #[test]
    fn pinch_drags_node_in_drag_mode() {
        let (_tx, mut s) = session();
        s.apply(Command::SetMode(Mode::Drag));
        let target = s.scene().nodes()[3].position;
        let screen = s.scene().camera().visible(target).unwrap();
        let (x, y) = (screen.x / 640.0, screen.y / 480.0);

        let mut replay = ReplayExtractor::from_frames(vec![
            vec![pinching_hand(x, y)],
            vec![pinching_hand(x + 0.001, y)],
        ]);
        s.step(&mut blank(), &mut replay);
        s.step(&mut blank(), &mut replay);
        assert_eq!(s.scene().selected(), Some(NodeId(3)));
        assert!(s.scene().nodes()[3].position[0] > target[0]);
    }

    #[test]
    fn extractor_errors_count_as_no_hands() {
        let (_tx, mut s) = session();
        let mut frame = blank();
        assert_eq!(s.step(&mut frame, &mut Failing), StepOutcome::Continue);
        assert!(frame.rgba.iter().any(|&b| b != 0));
    }

    #[test]
    fn wild_keypoints_still_render() {
        let (_tx, mut s) = session();
        let mut points = [(0.5, 0.5); crate::types::NUM_KEYPOINTS];
        points[0] = (-1e12, 0.5);
        points[1] = (1e12, 0.5);
        points[2] = (f32::NAN, f32::INFINITY);
        let mut replay = ReplayExtractor::from_frames(vec![vec![HandKeypoints::new(points)]]);
        let mut frame = blank();
        assert_eq!(s.step(&mut frame, &mut replay), StepOutcome::Continue);
        assert_eq!(frame.rgba.len(), 640 * 480 * 4);
    }

    #[test]
    fn replay_runs_to_completion_and_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let (_tx, mut s) = session();
        let mut replay = ReplayExtractor::from_frames(vec![
            vec![],
            vec![open_hand(0.3, 0.5), open_hand(0.7, 0.5)],
            vec![],
        ]);
        let mut viewport = HeadlessViewport::new(Some(path.clone()));
        run_loop(
            &mut s,
            &mut BlankFrames::new(320, 240),
            &mut replay,
            &mut viewport,
            &RunFlag::new(),
        )
        .unwrap();
        assert_eq!(s.frames(), 3);
        assert_eq!(viewport.presented(), 3);
        assert!(path.exists());
    }

    #[test]
    fn quit_command_stops_the_loop() {
        let (tx, mut s) = session();
        tx.send(Command::Quit).unwrap();
        let running = RunFlag::new();
        let mut replay = ReplayExtractor::from_frames(vec![vec![]; 10]);
        let mut viewport = HeadlessViewport::new(None);
        run_loop(
            &mut s,
            &mut BlankFrames::new(64, 48),
            &mut replay,
            &mut viewport,
            &running,
        )
        .unwrap();
        assert_eq!(s.frames(), 1);
        assert!(!running.is_running());
    }
}
