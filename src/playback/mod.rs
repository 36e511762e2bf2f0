//! Background music: a playlist driven through an external decoder process.

pub mod controller;
pub mod process;
pub mod protocol;
pub mod reader;

pub use controller::PlaybackController;
pub use process::CommandHost;
