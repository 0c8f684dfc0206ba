//! Administrator endpoints.

use actix_web::{HttpResponse, web};

use quill_shared::ApiResponse;

use super::posts::post_list;
use crate::middleware::auth::Actor;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/admin/verification
pub async fn pending_verification(
    state: web::Data<AppState>,
    actor: Actor,
) -> AppResult<HttpResponse> {
    let posts = state.listing.list_pending_verification(&actor).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_list(posts))))
}
