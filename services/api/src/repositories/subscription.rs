//! Subscription repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::subscription::{ChannelSummary, SubscriptionChange, toggle_subscription};

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    subscribers: i64,
    subscribed_to: Vec<Uuid>,
}

/// Subscription repository
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe `subscriber` to `channel`, or unsubscribe when already subscribed.
    ///
    /// Both rows are locked in id order inside one transaction, so the
    /// channel's count always moves together with the subscriber's list.
    /// Returns `None` when either account does not exist.
    pub async fn toggle(&self, subscriber: Uuid, channel: Uuid) -> Result<Option<SubscriptionChange>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, subscribers, subscribed_to
            FROM users
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(vec![subscriber, channel])
        .fetch_all(&mut *tx)
        .await?;

        let (Some(subscriber_row), Some(channel_row)) = (
            rows.iter().find(|row| row.id == subscriber),
            rows.iter().find(|row| row.id == channel),
        ) else {
            return Ok(None);
        };

        let mut subscribed_to = subscriber_row.subscribed_to.clone();
        let change = toggle_subscription(&mut subscribed_to, channel_row.subscribers, channel);

        sqlx::query("UPDATE users SET subscribed_to = $1 WHERE id = $2")
            .bind(&subscribed_to)
            .bind(subscriber)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET subscribers = $1 WHERE id = $2")
            .bind(change.subscribers)
            .bind(channel)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "User {} {} channel {}",
            subscriber,
            if change.is_subscribed { "subscribed to" } else { "unsubscribed from" },
            channel
        );
        Ok(Some(change))
    }

    /// Whether `user` follows `channel`; `None` when the user does not exist
    pub async fn is_subscribed(&self, user: Uuid, channel: Uuid) -> Result<Option<bool>> {
        let subscribed_to: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT subscribed_to FROM users WHERE id = $1")
                .bind(user)
                .fetch_optional(&self.pool)
                .await?;

        Ok(subscribed_to.map(|list| list.contains(&channel)))
    }

    /// Channels followed by `user`, in subscription order; `None` when the user does not exist
    pub async fn subscriptions(&self, user: Uuid) -> Result<Option<Vec<ChannelSummary>>> {
        let subscribed_to: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT subscribed_to FROM users WHERE id = $1")
                .bind(user)
                .fetch_optional(&self.pool)
                .await?;

        let Some(subscribed_to) = subscribed_to else {
            return Ok(None);
        };

        let channels = sqlx::query_as::<_, ChannelSummary>(
            r#"
            SELECT id, name, photo
            FROM users
            WHERE id = ANY($1)
            ORDER BY array_position($1, id)
            "#,
        )
        .bind(&subscribed_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(channels))
    }
}
