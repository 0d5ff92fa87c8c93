pub mod assist;
pub mod attitude;
pub mod axis;
pub mod controller;
pub mod guidance;
pub mod pid;
pub mod tuning;

pub use assist::{AssistFades, AssistTunings, Axis, RollTracking, StabilityAssistController};
pub use attitude::{AttitudeChannels, AttitudeControlLoop, AttitudeTunings, ChannelId};
pub use axis::{AxisState, FadeConfig};
pub use controller::{Controller, Manual};
pub use guidance::{attitude_error, target_direction, target_orientation, GuidanceMode};
pub use pid::PidChannel;
pub use tuning::PidTuning;
