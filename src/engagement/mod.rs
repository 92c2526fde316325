//! Engagement state machine.
//!
//! [`EngagementController`] arbitrates between three modes every tick:
//!
//! - **Idle**: nothing to engage, or engagement is not requested. A preview
//!   aim point may still be published for the overlay.
//! - **Ranged engage**: aim at the lead point of the selected agent (or a
//!   loot container when no agent is in view).
//! - **Melee lock**: steer into a nearby target once melee is equipped or an
//!   equip has been requested. The lock engages within the engage distance
//!   plus hysteresis and only lets go once the target leaves the wider
//!   detection radius.
//!
//! Commands for the host are appended to an [`IntentQueue`].

mod controller;
mod intents;
mod state;

pub use controller::EngagementController;
pub use intents::{Intent, IntentQueue};
pub use state::{AimMode, AimState, EngagementState, MoveIntent, Preview, TargetRef};
