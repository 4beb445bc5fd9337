//! Push Lifecycle
//!
//! The state machine owning the plugin pipeline. Every state is transient:
//! each event handler performs its primary action, dispatches the matching
//! hook concurrently with it, and returns to `Idle`. Hook outcomes never
//! gate the primary action.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::models::{ErrorEvent, Notification, PushMessage};
use crate::push::pipeline::{
    shared_state, HookEnv, LifecycleEvent, PluginPipeline, PushHook, SharedState,
};

// == Lifecycle State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Displaying,
    HandlingClick,
    HandlingError,
}

// == Notification Sink ==
/// The platform seam the lifecycle displays through. Delivery itself is
/// external to the worker.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn show(&self, notification: &Notification) -> anyhow::Result<()>;
    async fn open_window(&self, url: &str) -> anyhow::Result<()>;
    async fn close(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Sink used by the worker binary; the host platform owns actual display,
/// so this one only records what was asked of it.
#[derive(Debug, Default)]
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn show(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(title = %notification.title, "showing notification");
        Ok(())
    }

    async fn open_window(&self, url: &str) -> anyhow::Result<()> {
        info!(url, "opening window");
        Ok(())
    }

    async fn close(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(title = %notification.title, "closing notification");
        Ok(())
    }
}

// == Push Lifecycle ==
pub struct PushLifecycle {
    pipeline: PluginPipeline,
    sink: Arc<dyn NotificationSink>,
    state: RwLock<LifecycleState>,
    shared: SharedState,
}

impl PushLifecycle {
    pub fn new(pipeline: PluginPipeline, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            pipeline,
            sink,
            state: RwLock::new(LifecycleState::Idle),
            shared: shared_state(),
        }
    }

    /// Current state; transitions are transient, so outside of a running
    /// handler this is always `Idle`.
    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// `push`: show the notification, dispatch `received`, return to idle.
    pub async fn handle_push(&self, message: PushMessage) {
        self.set_state(LifecycleState::Displaying).await;

        let notification = Notification {
            title: message.title.clone(),
            options: message.options.clone(),
        };
        let env = self.env(LifecycleEvent::Push(message));

        let primary = async {
            // Shown regardless of hook outcomes
            if let Err(err) = self.sink.show(&notification).await {
                error!(error = %err, "failed to show notification");
            }
        };
        tokio::join!(primary, self.pipeline.dispatch(PushHook::Received, &env));

        self.set_state(LifecycleState::Idle).await;
    }

    /// `notificationclick`: open the target location when the notification
    /// carries one, close it, dispatch `clicked`, return to idle.
    pub async fn handle_notification_click(&self, notification: Notification) {
        self.set_state(LifecycleState::HandlingClick).await;

        let env = self.env(LifecycleEvent::Notification(notification.clone()));

        let primary = async {
            let target = notification
                .options
                .data
                .as_ref()
                .and_then(|data| data.url.as_deref());
            if let Some(url) = target {
                if let Err(err) = self.sink.open_window(url).await {
                    error!(error = %err, url, "failed to open window");
                }
            }
            if let Err(err) = self.sink.close(&notification).await {
                error!(error = %err, "failed to close notification");
            }
        };
        tokio::join!(primary, self.pipeline.dispatch(PushHook::Clicked, &env));

        self.set_state(LifecycleState::Idle).await;
    }

    /// `notificationclose`: no primary action, dispatch `dismissed`.
    pub async fn handle_notification_close(&self, notification: Notification) {
        let env = self.env(LifecycleEvent::Notification(notification));
        self.pipeline.dispatch(PushHook::Dismissed, &env).await;
    }

    /// `error`: record it, dispatch `errored`, return to idle.
    pub async fn handle_error(&self, event: ErrorEvent) {
        self.set_state(LifecycleState::HandlingError).await;

        let env = self.env(LifecycleEvent::Error(event.clone()));
        let primary = async {
            error!(message = %event.message, "worker error event");
        };
        tokio::join!(primary, self.pipeline.dispatch(PushHook::Errored, &env));

        self.set_state(LifecycleState::Idle).await;
    }

    fn env(&self, event: LifecycleEvent) -> HookEnv {
        HookEnv {
            event: Arc::new(event),
            state: self.shared.clone(),
        }
    }

    async fn set_state(&self, state: LifecycleState) {
        *self.state.write().await = state;
    }
}
