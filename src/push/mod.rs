//! Push Module
//!
//! Best-effort observability around push notifications: the plugin
//! pipeline, the lifecycle state machine that owns it, and the built-in
//! analytics plugin.

pub mod lifecycle;
pub mod pipeline;
pub mod plugins;

pub use lifecycle::{LifecycleState, LoggingSink, NotificationSink, PushLifecycle};
pub use pipeline::{
    shared_state, HookEnv, LifecycleEvent, PluginPipeline, PushHook, PushPlugin, SharedState,
};
pub use plugins::{AnalyticsOptions, AnalyticsPlugin};
