//! Interaction modes, command matching and gesture routing.

use std::fmt;

use crate::{
    scene::{NodeId, SceneGraph},
    types::GestureEvent,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Rotate,
    Drag,
    Zoom,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Rotate => "rotate",
            Mode::Drag => "drag",
            Mode::Zoom => "zoom",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetMode(Mode),
    ResetView,
    Quit,
}

const PHRASES: &[(&str, Command)] = &[
    ("rotate mode", Command::SetMode(Mode::Rotate)),
    ("rotation mode", Command::SetMode(Mode::Rotate)),
    ("drag mode", Command::SetMode(Mode::Drag)),
    ("dragging mode", Command::SetMode(Mode::Drag)),
    ("zoom mode", Command::SetMode(Mode::Zoom)),
    ("zooming mode", Command::SetMode(Mode::Zoom)),
    ("reset view", Command::ResetView),
    ("reset camera", Command::ResetView),
    ("center view", Command::ResetView),
];

const KEYWORDS: &[(&[&str], Command)] = &[
    (&["rotate", "rotation"], Command::SetMode(Mode::Rotate)),
    (&["drag", "move"], Command::SetMode(Mode::Drag)),
    (&["zoom", "scale"], Command::SetMode(Mode::Zoom)),
    (&["reset", "center", "home"], Command::ResetView),
];

impl Command {
    /// Matches free text against the phrase table, then single keywords.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        if let Some((_, cmd)) = PHRASES.iter().find(|(phrase, _)| text.contains(phrase)) {
            return Some(*cmd);
        }
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| text.contains(w)))
            .map(|(_, cmd)| *cmd)
    }

    /// Maps a key token such as `"r"` or `"escape"` to a command.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "r" => Some(Command::SetMode(Mode::Rotate)),
            "d" => Some(Command::SetMode(Mode::Drag)),
            "z" => Some(Command::SetMode(Mode::Zoom)),
            "c" | "home" => Some(Command::ResetView),
            "q" | "escape" | "esc" => Some(Command::Quit),
            _ => None,
        }
    }

    /// Single-token input is tried as a key first, anything else as a phrase.
    pub fn from_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if !trimmed.contains(char::is_whitespace) {
            if let Some(cmd) = Self::from_key(trimmed) {
                return Some(cmd);
            }
        }
        Self::parse(trimmed)
    }
}

/// What a gesture asks the scene to do, once the active mode accepted it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    DragAt {
        position: (f32, f32),
        displacement: (f32, f32),
    },
    Rotate {
        delta_yaw: f32,
        delta_pitch: f32,
    },
    Zoom {
        ratio: f32,
    },
}

/// Fixed mode/kind table; mismatched pairs are dropped.
pub fn route(mode: Mode, event: &GestureEvent) -> Option<Intent> {
    match (mode, event) {
        (Mode::Drag, GestureEvent::Pinch(g)) => Some(Intent::DragAt {
            position: g.position,
            displacement: g.displacement,
        }),
        (Mode::Rotate, GestureEvent::Fist(g)) => Some(Intent::Rotate {
            delta_yaw: g.displacement.0,
            delta_pitch: g.displacement.1,
        }),
        (Mode::Zoom, GestureEvent::TwoHandZoom(z)) => Some(Intent::Zoom { ratio: z.ratio }),
        _ => None,
    }
}

/// Holds the active mode; only commands move it.
#[derive(Clone, Debug, Default)]
pub struct ModeMachine {
    mode: Mode,
}

/// Result of applying one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Changed(Mode),
    Unchanged,
    Reset,
    Quit,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn apply_command(&mut self, command: Command, scene: &mut SceneGraph) -> Transition {
        match command {
            Command::SetMode(mode) if mode == self.mode => Transition::Unchanged,
            Command::SetMode(mode) => {
                log::info!("mode switched: {} -> {}", self.mode, mode);
                self.mode = mode;
                Transition::Changed(mode)
            }
            Command::ResetView => {
                scene.reset_view();
                Transition::Reset
            }
            Command::Quit => {
                log::info!("quit requested");
                Transition::Quit
            }
        }
    }

    /// Routes `event` through the active mode and applies the resulting
    /// intent. Returns the dragged node, if any.
    pub fn dispatch(&self, event: &GestureEvent, scene: &mut SceneGraph) -> Option<NodeId> {
        match route(self.mode, event)? {
            Intent::DragAt {
                position,
                displacement,
            } => scene.drag_at(position, displacement),
            Intent::Rotate {
                delta_yaw,
                delta_pitch,
            } => {
                scene.apply_rotation(delta_yaw, delta_pitch);
                None
            }
            Intent::Zoom { ratio } => {
                scene.apply_zoom(ratio);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        scene::camera::Vec3,
        types::{HandGesture, ZoomGesture},
    };

    fn hand(position: (f32, f32), displacement: (f32, f32)) -> HandGesture {
        HandGesture {
            position,
            displacement,
            confidence: 1.0,
        }
    }

    fn positions(scene: &SceneGraph) -> Vec<Vec3> {
        scene.nodes().iter().map(|n| n.position).collect()
    }

    #[test]
    fn exact_phrases_match_case_insensitively() {
        assert_eq!(
            Command::parse("Switch to DRAG MODE please"),
            Some(Command::SetMode(Mode::Drag))
        );
        assert_eq!(Command::parse("center view"), Some(Command::ResetView));
        assert_eq!(Command::parse("Reset Camera"), Some(Command::ResetView));
        assert_eq!(
            Command::parse("zooming mode"),
            Some(Command::SetMode(Mode::Zoom))
        );
    }

    #[test]
    fn keyword_fallback() {
        assert_eq!(
            Command::parse("let me move things"),
            Some(Command::SetMode(Mode::Drag))
        );
        assert_eq!(
            Command::parse("scale it"),
            Some(Command::SetMode(Mode::Zoom))
        );
        assert_eq!(Command::parse("go home"), Some(Command::ResetView));
        assert_eq!(Command::parse("hello there"), None);
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn key_bindings() {
        assert_eq!(Command::from_key("R"), Some(Command::SetMode(Mode::Rotate)));
        assert_eq!(Command::from_key("home"), Some(Command::ResetView));
        assert_eq!(Command::from_key("escape"), Some(Command::Quit));
        assert_eq!(Command::from_key("x"), None);
        assert_eq!(Command::from_input("q"), Some(Command::Quit));
        assert_eq!(
            Command::from_input("rotation mode"),
            Some(Command::SetMode(Mode::Rotate))
        );
    }

    #[test]
    fn route_table() {
        let pinch = GestureEvent::Pinch(hand((0.5, 0.5), (0.1, 0.0)));
        let fist = GestureEvent::Fist(hand((0.5, 0.5), (0.1, -0.2)));
        let zoom = GestureEvent::TwoHandZoom(ZoomGesture {
            left: (0.3, 0.5),
            right: (0.7, 0.5),
            distance: 0.4,
            ratio: 1.2,
        });

        assert!(matches!(route(Mode::Drag, &pinch), Some(Intent::DragAt { .. })));
        assert_eq!(
            route(Mode::Rotate, &fist),
            Some(Intent::Rotate {
                delta_yaw: 0.1,
                delta_pitch: -0.2
            })
        );
        assert_eq!(route(Mode::Zoom, &zoom), Some(Intent::Zoom { ratio: 1.2 }));

        for (mode, event) in [
            (Mode::Drag, fist),
            (Mode::Drag, zoom),
            (Mode::Rotate, pinch),
            (Mode::Zoom, pinch),
            (Mode::Zoom, GestureEvent::None),
        ] {
            assert_eq!(route(mode, &event), None, "{mode} / {:?}", event.kind());
        }
    }

    #[test]
    fn fist_in_drag_mode_moves_nothing() {
        let mut scene = SceneGraph::sample(&AppConfig::default());
        let mut machine = ModeMachine::new();
        machine.apply_command(Command::SetMode(Mode::Drag), &mut scene);

        let before = positions(&scene);
        let target = scene.camera().visible(before[0]).unwrap();
        let (w, h) = scene.camera().viewport();
        let event = GestureEvent::Fist(hand((target.x / w as f32, target.y / h as f32), (0.1, 0.1)));
        assert_eq!(machine.dispatch(&event, &mut scene), None);
        assert_eq!(positions(&scene), before);
        assert_eq!(scene.camera().yaw(), 0.0);
    }

    #[test]
    fn gestures_never_change_mode() {
        let mut scene = SceneGraph::sample(&AppConfig::default());
        let machine = ModeMachine::new();
        machine.dispatch(&GestureEvent::Pinch(hand((0.5, 0.5), (0.2, 0.0))), &mut scene);
        assert_eq!(machine.mode(), Mode::Rotate);
    }

    #[test]
    fn commands_drive_transitions() {
        let mut scene = SceneGraph::sample(&AppConfig::default());
        let mut machine = ModeMachine::new();
        assert_eq!(
            machine.apply_command(Command::SetMode(Mode::Rotate), &mut scene),
            Transition::Unchanged
        );
        assert_eq!(
            machine.apply_command(Command::SetMode(Mode::Zoom), &mut scene),
            Transition::Changed(Mode::Zoom)
        );

        let zoom = GestureEvent::TwoHandZoom(ZoomGesture {
            left: (0.3, 0.5),
            right: (0.7, 0.5),
            distance: 0.4,
            ratio: 2.0,
        });
        machine.dispatch(&zoom, &mut scene);
        assert_eq!(scene.camera().zoom(), 3.0);

        assert_eq!(
            machine.apply_command(Command::ResetView, &mut scene),
            Transition::Reset
        );
        assert_eq!(scene.camera().zoom(), 1.5);
        assert_eq!(machine.mode(), Mode::Zoom);
        assert_eq!(
            machine.apply_command(Command::Quit, &mut scene),
            Transition::Quit
        );
    }

    #[test]
    fn rotate_mode_fist_turns_camera() {
        let mut scene = SceneGraph::sample(&AppConfig::default());
        let machine = ModeMachine::new();
        machine.dispatch(&GestureEvent::Fist(hand((0.5, 0.5), (0.1, 0.1))), &mut scene);
        assert!((scene.camera().yaw() - 0.1 * 2.0 * 0.01).abs() < 1e-6);
    }
}
