use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::item::{ItemStatus, ItemUpdate, NewItem, SavedItem, SavedItemRow};

/// Persistence for saved items. Carried by the pipeline as `Arc<dyn ItemStore>`.
///
/// `update` only applies to items still PENDING or PROCESSING; a terminal
/// item is never rewritten.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn create(&self, item: NewItem) -> Result<SavedItem, AppError>;

    async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<SavedItem, AppError>;

    /// Newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedItem>, AppError>;

    async fn find_for_user(&self, id: Uuid, user_id: &str) -> Result<Option<SavedItem>, AppError>;
}

/// `saved_items` in PostgreSQL.
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn create(&self, item: NewItem) -> Result<SavedItem, AppError> {
        let row = sqlx::query_as::<_, SavedItemRow>(
            r#"
            INSERT INTO saved_items (id, user_id, url, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&item.user_id)
        .bind(&item.url)
        .bind(item.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(SavedItem::try_from(row)?)
    }

    async fn update(&self, id: Uuid, update: ItemUpdate) -> Result<SavedItem, AppError> {
        let row = match &update {
            ItemUpdate::Completed(fields) => {
                sqlx::query_as::<_, SavedItemRow>(
                    r#"
                    UPDATE saved_items
                    SET title = $2, content = $3, author = $4, og_image = $5,
                        published_at = $6, status = $7
                    WHERE id = $1 AND status IN ('PENDING', 'PROCESSING')
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(&fields.title)
                .bind(&fields.content)
                .bind(&fields.author)
                .bind(&fields.og_image)
                .bind(fields.published_at)
                .bind(ItemStatus::Completed.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
            ItemUpdate::Failed => {
                sqlx::query_as::<_, SavedItemRow>(
                    r#"
                    UPDATE saved_items
                    SET status = $2
                    WHERE id = $1 AND status IN ('PENDING', 'PROCESSING')
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(ItemStatus::Failed.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        let row = row.ok_or_else(|| {
            AppError::NotFound(format!("Item {id} is not awaiting extraction"))
        })?;
        info!("Updated saved item {id} to {}", update.status());
        Ok(SavedItem::try_from(row)?)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<SavedItem>, AppError> {
        let rows = sqlx::query_as::<_, SavedItemRow>(
            "SELECT * FROM saved_items WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| SavedItem::try_from(row).map_err(AppError::Internal))
            .collect()
    }

    async fn find_for_user(&self, id: Uuid, user_id: &str) -> Result<Option<SavedItem>, AppError> {
        let row = sqlx::query_as::<_, SavedItemRow>(
            "SELECT * FROM saved_items WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SavedItem::try_from)
            .transpose()
            .map_err(AppError::Internal)
    }
}
