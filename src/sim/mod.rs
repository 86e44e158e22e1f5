/// Injectable wall-clock time.
pub mod clock;
/// Device commands and outcomes.
pub mod command;
pub mod engine;
/// Grid context model.
pub mod grid;
pub mod job;
/// Device registry and tick loop.
pub mod registry;
pub mod seed;
