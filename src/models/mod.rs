//! Request, response and message models for the caching relay
//!
//! This module defines the HTTP-like request/response shapes the core
//! consumes and produces, and the DTOs of the worker event surface.

pub mod messages;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use messages::{
    ErrorEvent, NavigationLocation, NavigationMessage, Notification, NotificationData,
    NotificationOptions, PushControlKind, PushControlMessage, PushMessage, PushSubscription,
    RouteInfo, RouteManifest, RouteMatch, SubscriptionKeys, NAVIGATION_MESSAGE_TYPE,
};
pub use request::{MatchOptions, WorkerRequest};
pub use response::WorkerResponse;
