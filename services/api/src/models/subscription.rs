//! Channel subscription models

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Outcome of a subscription toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionChange {
    pub is_subscribed: bool,
    pub subscribers: i64,
}

/// Toggle `channel` in a subscriber's list and adjust the channel's count.
///
/// The count never drops below zero.
pub fn toggle_subscription(
    subscribed_to: &mut Vec<Uuid>,
    subscribers: i64,
    channel: Uuid,
) -> SubscriptionChange {
    if subscribed_to.contains(&channel) {
        subscribed_to.retain(|id| *id != channel);
        SubscriptionChange {
            is_subscribed: false,
            subscribers: (subscribers - 1).max(0),
        }
    } else {
        subscribed_to.push(channel);
        SubscriptionChange {
            is_subscribed: true,
            subscribers: subscribers + 1,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub message: String,
    pub subscribers: i64,
    pub is_subscribed: bool,
}

impl From<SubscriptionChange> for SubscribeResponse {
    fn from(change: SubscriptionChange) -> Self {
        let message = if change.is_subscribed {
            "Subscribed successfully"
        } else {
            "Unsubscribed successfully"
        };

        Self {
            message: message.to_string(),
            subscribers: change.subscribers,
            is_subscribed: change.is_subscribed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
}

/// A followed channel
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChannelSummary {
    pub id: Uuid,
    pub name: String,
    pub photo: String,
}
