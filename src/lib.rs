pub mod app;
pub mod audio;
pub mod config;
pub mod model;
pub mod play;
pub mod render;
pub mod run;
pub mod state;
pub mod traits;
pub mod util;

#[cfg(test)]
mod test_utils;
