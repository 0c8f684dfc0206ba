//! Post lifecycle endpoints and the public feed.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{NewPost, Post, PostPatch, VerificationState};
use quill_shared::ApiResponse;
use quill_shared::dto::{FeedQuery, PostListResponse, PostResponse};

use crate::middleware::auth::{Actor, MaybeActor};
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub(crate) fn post_response(post: Post) -> PostResponse {
    let read_time_minutes = post.read_time_minutes();
    let verification_state = match post.verification_state() {
        VerificationState::Unrequested => "unrequested",
        VerificationState::Pending => "pending",
        VerificationState::Verified => "verified",
    };

    PostResponse {
        id: post.id.to_string(),
        author_id: post.author_id.to_string(),
        author_name: post.author_name,
        title: post.title,
        content: post.content,
        excerpt: post.excerpt,
        published: post.published,
        verification_requested: post.verification_requested,
        verified: post.verified,
        verified_at: post.verified_at.map(|t| t.to_rfc3339()),
        verification_state: verification_state.to_string(),
        background_image_url: post.background_image_url,
        tags: post.tags,
        read_time_minutes,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

pub(crate) fn post_list(posts: Vec<Post>) -> PostListResponse {
    PostListResponse::new(posts.into_iter().map(post_response).collect())
}

/// GET /api/posts?limit&offset
pub async fn public_feed(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let limit = query
        .limit
        .unwrap_or(state.listing.config().default_limit);
    let offset = query.offset.unwrap_or(0);

    let posts = state.listing.list_public_feed(limit, Some(offset)).await?;
    let limit = limit.min(state.listing.config().max_limit);
    let page = PostListResponse::paged(
        posts.into_iter().map(post_response).collect(),
        limit,
        offset,
    );

    Ok(HttpResponse::Ok().json(ApiResponse::ok(page)))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    viewer: MaybeActor,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.listing.get_post(&viewer, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_response(post))))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    actor: Actor,
    body: web::Json<NewPost>,
) -> AppResult<HttpResponse> {
    let post = state.lifecycle.create_post(&actor, body.into_inner()).await?;
    let message = if post.published {
        "Post published!"
    } else {
        "Draft saved!"
    };

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(post_response(post), message)))
}

/// PATCH /api/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<PostPatch>,
) -> AppResult<HttpResponse> {
    let post = state
        .lifecycle
        .update_post(&actor, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_response(post))))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.lifecycle.delete_post(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted")))
}

/// POST /api/posts/{id}/verify
pub async fn verify_post(
    state: web::Data<AppState>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.lifecycle.verify_post(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        post_response(post),
        "Post verified",
    )))
}
