pub mod autoplay;
mod caroling_session;
mod events;
mod session_result;
mod timer_manager;

pub use autoplay::{AutoplayProfile, plan_presses};
pub use caroling_session::{
    CarolingSession, SessionChart, SessionPhase, SessionSettings, SessionSetup,
};
pub use events::SessionEvent;
pub use session_result::{EndReason, SessionResult};
pub use timer_manager::{DueTimer, TimerKind, TimerManager};
