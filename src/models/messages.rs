//! Message DTOs for the worker event surface
//!
//! Navigation messages posted by the client router, the push control
//! contract, and the push lifecycle event bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// == Navigation ==

/// Message type marker for client-side navigations.
pub const NAVIGATION_MESSAGE_TYPE: &str = "REMIX_NAVIGATION";

/// A navigation event posted by the client-side router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationMessage {
    /// Message discriminator, `REMIX_NAVIGATION` for navigations
    #[serde(rename = "type")]
    pub kind: String,
    /// True on the initial mount of the document
    pub is_mount: bool,
    /// Current location
    pub location: NavigationLocation,
    /// Route manifest for the application
    pub manifest: RouteManifest,
    /// Routes matched by this navigation, outermost first
    pub matches: Vec<RouteMatch>,
}

/// A client-side location split into its components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationLocation {
    pub pathname: String,
    /// Query string including the leading `?`, or empty
    #[serde(default)]
    pub search: String,
    /// Fragment including the leading `#`, or empty
    #[serde(default)]
    pub hash: String,
}

impl NavigationLocation {
    /// The document URL for this location.
    pub fn document_url(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }
}

/// Route table of the application manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: HashMap<String, RouteInfo>,
}

/// Per-route manifest entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    /// True iff the route serves loader data
    #[serde(default)]
    pub has_loader: bool,
}

/// One matched route of a navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteMatch {
    pub id: String,
}

// == Push control contract ==

/// Control message accepted by the push endpoint. Delivery itself (VAPID
/// signing, the push gateway) is external to the worker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushControlMessage {
    #[serde(rename = "type")]
    pub kind: PushControlKind,
    #[serde(default)]
    pub subscription: Option<PushSubscription>,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// The three push control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushControlKind {
    Subscribe,
    Unsubscribe,
    Notify,
}

/// A push subscription as registered by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

/// Key material carried by a push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub auth: String,
    pub p256dh: String,
}

// == Push lifecycle events ==

/// Payload of an incoming push event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    #[serde(default)]
    pub options: NotificationOptions,
}

/// A displayed notification, as carried by click/close events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    #[serde(default)]
    pub options: NotificationOptions,
}

/// Display options of a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationOptions {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

/// Application data attached to a notification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationData {
    /// Location to open when the notification is clicked
    #[serde(default)]
    pub url: Option<String>,
}

/// Body of a worker error event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}
