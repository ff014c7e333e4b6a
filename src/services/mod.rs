pub mod lifecycle;
pub use lifecycle::{
    IssuedSetupCode, LifecycleError, LifecycleService, flat_status, request_status,
};

pub mod lifecycle_impl;
pub use lifecycle_impl::SeaOrmLifecycleService;

pub mod telemetry;
pub use telemetry::{Telemetry, TelemetryCounters};

pub mod broadcaster;
pub use broadcaster::Snapshot;
