//! Business logic services for the application layer.

pub mod click_recorder;
pub mod fraud_guard;
pub mod resolver;

pub use click_recorder::{ClickRecorder, ClickRecorderOptions};
pub use fraud_guard::{FraudGuard, FraudGuardOptions, FraudVerdict};
pub use resolver::{Resolution, Resolver, ResolverOptions};
