use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgListener;

use super::{OpinionStore, SnapshotHandler, StoreError, Subscription};
use crate::models::opinion::{Opinion, OpinionId, OpinionRecord, Stance};

/// Channel the `opinions` table trigger notifies on insert and delete.
pub const CHANGE_CHANNEL: &str = "opinions_changed";

/// Shared live store backed by PostgreSQL. Changes reach subscribers
/// through `LISTEN/NOTIFY`; each notification triggers a full ordered
/// re-read of the collection.
#[derive(Clone)]
pub struct PgOpinionStore {
    pool: PgPool,
}

impl PgOpinionStore {
    pub fn new(pool: PgPool) -> Self {
        PgOpinionStore { pool }
    }
}

/// Read every opinion, newest first. Rows whose stance is not one of the
/// three tags are skipped.
pub async fn find_all_ordered(pool: &PgPool) -> Result<Vec<Opinion>, sqlx::Error> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: String,
        name: String,
        partner: String,
        stance: String,
        opinion: String,
        submitted_at: DateTime<Utc>,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT id::text AS id, name, partner, stance, opinion, submitted_at \
         FROM opinions \
         ORDER BY submitted_at DESC",
    )
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .filter_map(|row| match row.stance.parse::<Stance>() {
            Ok(stance) => Some(Opinion {
                id: OpinionId(row.id),
                name: row.name,
                partner: row.partner,
                stance,
                opinion: row.opinion,
                timestamp: row.submitted_at,
            }),
            Err(e) => {
                log::warn!("Skipping opinion row {}: {e}", row.id);
                None
            }
        })
        .collect();

    Ok(items)
}

#[async_trait]
impl OpinionStore for PgOpinionStore {
    async fn create(&self, record: OpinionRecord) -> Result<OpinionId, StoreError> {
        let id: String = sqlx::query_scalar(
            "INSERT INTO opinions (name, partner, stance, opinion, submitted_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id::text",
        )
        .bind(&record.name)
        .bind(&record.partner)
        .bind(record.stance.as_str())
        .bind(&record.opinion)
        .bind(record.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(OpinionId(id))
    }

    async fn delete(&self, id: &OpinionId) -> Result<(), StoreError> {
        // Compared as text so a malformed id just matches nothing.
        sqlx::query("DELETE FROM opinions WHERE id::text = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, handler: SnapshotHandler) -> Result<Subscription, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        let pool = self.pool.clone();

        let task = tokio::spawn(async move {
            match find_all_ordered(&pool).await {
                Ok(list) => handler(Ok(list)),
                Err(e) => {
                    handler(Err(e.into()));
                    return;
                }
            }

            // A dropped connection shows up as `Ok(None)`. Notifications sent
            // while it was down are lost, so that ends the subscription.
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        log::debug!("opinions changed: {}", notification.payload());
                        match find_all_ordered(&pool).await {
                            Ok(list) => handler(Ok(list)),
                            Err(e) => {
                                handler(Err(e.into()));
                                return;
                            }
                        }
                    }
                    Ok(None) => {
                        handler(Err(StoreError::Subscription(
                            "listener connection lost".to_string(),
                        )));
                        return;
                    }
                    Err(e) => {
                        handler(Err(StoreError::Subscription(e.to_string())));
                        return;
                    }
                }
            }
        });

        Ok(Subscription::from_task(task))
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}
