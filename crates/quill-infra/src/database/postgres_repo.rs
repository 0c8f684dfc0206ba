//! PostgreSQL post store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges};
use quill_core::error::RepoError;
use quill_core::ports::{PostQuery, PostRepository, SortOrder};

use super::entity::post::{self, Entity as PostEntity, tags_to_json};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Post, RepoError> {
        let mut active = post::ActiveModel {
            id: Set(id),
            updated_at: Set(changes.updated_at.into()),
            ..Default::default()
        };
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(excerpt) = changes.excerpt {
            active.excerpt = Set(Some(excerpt));
        }
        if let Some(published) = changes.published {
            active.published = Set(published);
        }
        if let Some(url) = changes.background_image_url {
            active.background_image_url = Set(url);
        }
        if let Some(tags) = changes.tags {
            active.tags = Set(tags_to_json(tags));
        }

        // Single UPDATE ... RETURNING; a missing row surfaces as RecordNotUpdated.
        let model = active.update(&self.db).await.map_err(repo_error)?;
        tracing::debug!(post_id = %id, "Post row updated");

        Ok(model.into())
    }

    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, RepoError> {
        let verified_at: DateTimeWithTimeZone = at.into();

        let result = PostEntity::update_many()
            .col_expr(post::Column::Verified, Expr::value(true))
            .col_expr(post::Column::VerifiedAt, Expr::value(verified_at))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::Verified.eq(false))
            .filter(post::Column::VerificationRequested.eq(true))
            .exec(&self.db)
            .await
            .map_err(repo_error)?;

        tracing::debug!(post_id = %id, rows = result.rows_affected, "Conditional verify");
        Ok(result.rows_affected == 1)
    }

    async fn query(&self, query: &PostQuery) -> Result<Vec<Post>, RepoError> {
        let filter = &query.filter;
        let mut select = PostEntity::find();

        if let Some(author_id) = filter.author_id {
            select = select.filter(post::Column::AuthorId.eq(author_id));
        }
        if let Some(published) = filter.published {
            select = select.filter(post::Column::Published.eq(published));
        }
        if let Some(verified) = filter.verified {
            select = select.filter(post::Column::Verified.eq(verified));
        }
        if let Some(requested) = filter.verification_requested {
            select = select.filter(post::Column::VerificationRequested.eq(requested));
        }

        select = match query.order {
            SortOrder::Ascending => select
                .order_by_asc(post::Column::CreatedAt)
                .order_by_asc(post::Column::Id),
            SortOrder::Descending => select
                .order_by_desc(post::Column::CreatedAt)
                .order_by_desc(post::Column::Id),
        };

        let result = select
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}
