//! Built-in Plugins
//!
//! The analytics plugin keeps per-hook counters behind per-hook toggles.
//! Counters are atomics; plugins own no state beyond their own.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::push::pipeline::{HookEnv, PushHook, PushPlugin};

/// Which hooks the analytics plugin tracks.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsOptions {
    pub track_received: bool,
    pub track_clicked: bool,
    pub track_dismissed: bool,
    pub track_errors: bool,
}

impl Default for AnalyticsOptions {
    fn default() -> Self {
        Self {
            track_received: true,
            track_clicked: true,
            track_dismissed: true,
            track_errors: true,
        }
    }
}

// == Analytics Plugin ==
#[derive(Debug, Default)]
pub struct AnalyticsPlugin {
    options: AnalyticsOptions,
    received: AtomicU64,
    clicked: AtomicU64,
    dismissed: AtomicU64,
    errors: AtomicU64,
}

impl AnalyticsPlugin {
    pub fn new(options: AnalyticsOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }

    pub fn clicked_count(&self) -> u64 {
        self.clicked.load(Ordering::SeqCst)
    }

    pub fn dismissed_count(&self) -> u64 {
        self.dismissed.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushPlugin for AnalyticsPlugin {
    fn handles(&self, hook: PushHook) -> bool {
        match hook {
            PushHook::Received => self.options.track_received,
            PushHook::Clicked => self.options.track_clicked,
            PushHook::Dismissed => self.options.track_dismissed,
            PushHook::Errored => self.options.track_errors,
        }
    }

    async fn received(&self, _env: &HookEnv) -> anyhow::Result<()> {
        let count = self.received.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "push received");
        Ok(())
    }

    async fn clicked(&self, _env: &HookEnv) -> anyhow::Result<()> {
        let count = self.clicked.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "push clicked");
        Ok(())
    }

    async fn dismissed(&self, _env: &HookEnv) -> anyhow::Result<()> {
        let count = self.dismissed.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "push dismissed");
        Ok(())
    }

    async fn errored(&self, _env: &HookEnv) -> anyhow::Result<()> {
        let count = self.errors.fetch_add(1, Ordering::SeqCst) + 1;
        info!(count, "push error");
        Ok(())
    }
}
