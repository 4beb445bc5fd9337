//! Plugin Pipeline
//!
//! Ordered, best-effort hook dispatch for push lifecycle events. Plugins
//! advertise the hooks they implement through a capability query; dispatch
//! invokes only those, concurrently, and a failing plugin never reaches the
//! pipeline caller or its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::error;

use crate::models::{ErrorEvent, Notification, PushMessage};

// == Hooks ==
/// The lifecycle hooks a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushHook {
    Received,
    Clicked,
    Dismissed,
    Errored,
}

/// The event a hook observes.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Push(PushMessage),
    Notification(Notification),
    Error(ErrorEvent),
}

/// State shared between plugins across dispatches.
pub type SharedState = Arc<RwLock<HashMap<String, serde_json::Value>>>;

/// What every invoked hook receives.
#[derive(Clone)]
pub struct HookEnv {
    pub event: Arc<LifecycleEvent>,
    pub state: SharedState,
}

// == Plugin Trait ==
/// An observer of push lifecycle events.
///
/// `handles` is the capability query; a hook method is only invoked when the
/// plugin advertises the matching hook. Hooks are observability-only and
/// must never gate the primary action.
#[async_trait]
pub trait PushPlugin: Send + Sync {
    fn handles(&self, hook: PushHook) -> bool;

    async fn received(&self, env: &HookEnv) -> anyhow::Result<()> {
        let _ = env;
        Ok(())
    }

    async fn clicked(&self, env: &HookEnv) -> anyhow::Result<()> {
        let _ = env;
        Ok(())
    }

    async fn dismissed(&self, env: &HookEnv) -> anyhow::Result<()> {
        let _ = env;
        Ok(())
    }

    async fn errored(&self, env: &HookEnv) -> anyhow::Result<()> {
        let _ = env;
        Ok(())
    }
}

// == Pipeline ==
/// Ordered list of plugins sharing one dispatch.
pub struct PluginPipeline {
    plugins: Vec<Arc<dyn PushPlugin>>,
}

impl PluginPipeline {
    pub fn new(plugins: Vec<Arc<dyn PushPlugin>>) -> Self {
        Self { plugins }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Invokes the hook on every plugin that advertises it, concurrently.
    ///
    /// A plugin failure is logged and isolated; it neither propagates nor
    /// prevents sibling hooks from completing.
    pub async fn dispatch(&self, hook: PushHook, env: &HookEnv) {
        let invocations = self
            .plugins
            .iter()
            .enumerate()
            .filter(|(_, plugin)| plugin.handles(hook))
            .map(|(index, plugin)| {
                let env = env.clone();
                async move {
                    let result = match hook {
                        PushHook::Received => plugin.received(&env).await,
                        PushHook::Clicked => plugin.clicked(&env).await,
                        PushHook::Dismissed => plugin.dismissed(&env).await,
                        PushHook::Errored => plugin.errored(&env).await,
                    };
                    if let Err(err) = result {
                        error!(plugin = index, hook = ?hook, error = %err, "plugin hook failed");
                    }
                }
            });
        join_all(invocations).await;
    }
}

/// An empty shared-state map.
pub fn shared_state() -> SharedState {
    Arc::new(RwLock::new(HashMap::new()))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn env() -> HookEnv {
        HookEnv {
            event: Arc::new(LifecycleEvent::Push(PushMessage {
                title: "hi".to_string(),
                options: Default::default(),
            })),
            state: shared_state(),
        }
    }

    #[derive(Default)]
    struct CountingPlugin {
        received: AtomicU64,
        dismissed: AtomicU64,
    }

    #[async_trait]
    impl PushPlugin for CountingPlugin {
        fn handles(&self, hook: PushHook) -> bool {
            matches!(hook, PushHook::Received | PushHook::Dismissed)
        }

        async fn received(&self, _env: &HookEnv) -> anyhow::Result<()> {
            self.received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn dismissed(&self, _env: &HookEnv) -> anyhow::Result<()> {
            self.dismissed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingPlugin;

    #[async_trait]
    impl PushPlugin for FailingPlugin {
        fn handles(&self, _hook: PushHook) -> bool {
            true
        }

        async fn received(&self, _env: &HookEnv) -> anyhow::Result<()> {
            anyhow::bail!("analytics backend unreachable")
        }
    }

    struct ClickedOnlyPlugin;

    #[async_trait]
    impl PushPlugin for ClickedOnlyPlugin {
        fn handles(&self, hook: PushHook) -> bool {
            hook == PushHook::Clicked
        }

        async fn received(&self, _env: &HookEnv) -> anyhow::Result<()> {
            panic!("must not be invoked for a hook it does not advertise")
        }
    }

    #[tokio::test]
    async fn test_failing_plugin_is_isolated() {
        let counting = Arc::new(CountingPlugin::default());
        let pipeline =
            PluginPipeline::new(vec![Arc::new(FailingPlugin), counting.clone()]);

        pipeline.dispatch(PushHook::Received, &env()).await;

        assert_eq!(counting.received.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_only_advertised_hooks_are_invoked() {
        let counting = Arc::new(CountingPlugin::default());
        let pipeline =
            PluginPipeline::new(vec![Arc::new(ClickedOnlyPlugin), counting.clone()]);

        pipeline.dispatch(PushHook::Received, &env()).await;
        pipeline.dispatch(PushHook::Dismissed, &env()).await;

        assert_eq!(counting.received.load(Ordering::SeqCst), 1);
        assert_eq!(counting.dismissed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shared_state_is_visible_across_plugins() {
        struct WriterPlugin;

        #[async_trait]
        impl PushPlugin for WriterPlugin {
            fn handles(&self, hook: PushHook) -> bool {
                hook == PushHook::Received
            }

            async fn received(&self, env: &HookEnv) -> anyhow::Result<()> {
                env.state
                    .write()
                    .await
                    .insert("seen".to_string(), serde_json::json!(true));
                Ok(())
            }
        }

        let pipeline = PluginPipeline::new(vec![Arc::new(WriterPlugin)]);
        let env = env();
        pipeline.dispatch(PushHook::Received, &env).await;

        assert_eq!(env.state.read().await.get("seen"), Some(&serde_json::json!(true)));
    }
}
