//! Cambot Core Library
//!
//! Control loops for an automated camera avatar in a multiplayer game:
//! a teleport scheduler rotating through the connected players, and a
//! movement controller framing the current one.
//!
//! Everything here is sans-IO. The game session, the pathfinder and the
//! chat transport are reached through the traits in [`session`]; the
//! [`runtime`] module glues them to the [`controller::Controller`] on a
//! tokio event loop.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod announce;
pub mod classifier;
pub mod controller;
pub mod geometry;
pub mod movement;
pub mod probe;
pub mod roster;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod smoother;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_utils;

pub use controller::Controller;
pub use geometry::{Pose, Subject};
pub use movement::MovementController;
pub use session::{Action, Outbound, Pathfinder, PathfinderError, SessionEvent, World};
pub use settings::{Settings, SettingsError, SharedSettings, ViewMode};
