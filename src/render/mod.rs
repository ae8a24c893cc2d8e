//! Presentation of caroling sessions.
//!
//! This module provides:
//! - [`PresentationAdapter`]: session events to [`ScenePresenter`](crate::traits::render::ScenePresenter) calls
//! - [`ConsolePresenter`]: text output for headless runs
//! - [`CommandRecorder`]: records presenter calls for tests

mod adapter;
mod command_recorder;
mod console;

pub use adapter::PresentationAdapter;
pub use command_recorder::{CommandRecorder, PresentCommand};
pub use console::ConsolePresenter;
