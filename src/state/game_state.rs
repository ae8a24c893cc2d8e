use anyhow::Result;

use crate::traits::input::KeyEvent;

/// Transition result from a scene callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTransition {
    /// Stay in the current scene.
    None,
    /// The scene finished normally (e.g., caroling -> overworld with a result).
    Next,
    /// The scene was abandoned (e.g., the player walked away mid-song).
    Back,
}

/// Lifecycle of a scene driven by the embedding game.
///
/// All timestamps are wall-clock microseconds from the game's time provider.
pub trait Scene {
    /// Called once when entering.
    fn on_enter(&mut self, now_us: i64) -> Result<()>;

    /// Called every frame.
    fn on_tick(&mut self, now_us: i64) -> Result<StateTransition>;

    /// Called for each key press, before the frame's tick.
    fn on_input(&mut self, event: KeyEvent) -> Result<StateTransition>;

    /// Called once when leaving. Must release audio.
    fn on_exit(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyScene {
        entered_at: Option<i64>,
        exited: bool,
        presses: u32,
    }

    impl DummyScene {
        fn new() -> Self {
            Self {
                entered_at: None,
                exited: false,
                presses: 0,
            }
        }
    }

    impl Scene for DummyScene {
        fn on_enter(&mut self, now_us: i64) -> Result<()> {
            self.entered_at = Some(now_us);
            Ok(())
        }

        fn on_tick(&mut self, _now_us: i64) -> Result<StateTransition> {
            if self.presses >= 2 {
                Ok(StateTransition::Next)
            } else {
                Ok(StateTransition::None)
            }
        }

        fn on_input(&mut self, _event: KeyEvent) -> Result<StateTransition> {
            self.presses += 1;
            Ok(StateTransition::None)
        }

        fn on_exit(&mut self) {
            self.exited = true;
        }
    }

    #[test]
    fn scene_lifecycle() {
        let mut scene = DummyScene::new();
        scene.on_enter(16_667).unwrap();
        assert_eq!(scene.entered_at, Some(16_667));

        assert_eq!(scene.on_tick(33_333).unwrap(), StateTransition::None);
        let press = KeyEvent {
            lane: 0,
            time_us: 40_000,
        };
        scene.on_input(press).unwrap();
        scene.on_input(press).unwrap();
        assert_eq!(scene.on_tick(50_000).unwrap(), StateTransition::Next);

        scene.on_exit();
        assert!(scene.exited);
    }
}
