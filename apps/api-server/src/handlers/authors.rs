//! Author dashboard listing.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_shared::ApiResponse;

use super::posts::post_list;
use crate::middleware::auth::Actor;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/authors/{id}/posts
///
/// Drafts included. Only the author or an administrator.
pub async fn author_posts(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let posts = state
        .listing
        .list_by_author(&actor, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_list(posts))))
}
