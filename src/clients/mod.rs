pub mod live_routing;

pub use live_routing::{LiveError, LiveRoutingClient};
