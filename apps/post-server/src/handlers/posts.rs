//! Post and interaction handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::domain::{Comment, Post};
use agora_core::service::{CreatePost, ListComments, ListPosts, UpdatePost};
use agora_shared::dto::{
    CommentListResponse, CommentResponse, CreateCommentRequest, CreatePostRequest,
    LikePostResponse, ListCommentsQuery, ListPostsQuery, PostListResponse, PostResponse,
    UpdatePostRequest, ViewPostResponse,
};

use crate::middleware::{AppError, AppResult, CallerId, RequestDeadline};
use crate::state::AppState;

fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid post id '{raw}'")))
}

fn post_response(post: Post) -> PostResponse {
    let tags = post.tag_names();
    PostResponse {
        id: post.id.to_string(),
        is_private: post.is_private(),
        title: post.title,
        description: post.description,
        creator_id: post.creator_id,
        tags,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id.to_string(),
        post_id: comment.post_id.to_string(),
        author_id: comment.author_id,
        content: comment.content,
        created_at: comment.created_at.to_rfc3339(),
    }
}

/// POST /api/posts
pub async fn create_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let cmd = CreatePost {
        title: req.title,
        description: req.description,
        creator_id: caller.into_inner(),
        is_private: req.is_private,
        tags: req.tags,
    };

    let post = deadline.run(state.posts.create_post(cmd)).await?;
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// GET /api/posts
pub async fn list_posts(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let cmd = ListPosts {
        page: query.page,
        page_size: query.page_size,
        tags: query.tag_list(),
        creator_id: query.creator_id,
        requester_id: caller.into_inner(),
    };

    let page = deadline.run(state.posts.list_posts(cmd)).await?;
    Ok(HttpResponse::Ok().json(PostListResponse {
        total_count: page.total_count,
        total_pages: page.total_pages,
        posts: page.items.into_iter().map(post_response).collect(),
    }))
}

/// GET /api/posts/{id}
pub async fn get_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let post = deadline
        .run(state.posts.get_post(id, caller.as_str()))
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let req = body.into_inner();
    let cmd = UpdatePost {
        id,
        title: req.title,
        description: req.description,
        is_private: req.is_private,
        tags: req.tags,
        updater_id: caller.into_inner(),
    };

    let post = deadline.run(state.posts.update_post(cmd)).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    deadline
        .run(state.posts.delete_post(id, caller.as_str()))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/view
pub async fn view_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let viewed = deadline
        .run(state.posts.view_post(id, caller.as_str()))
        .await?;
    Ok(HttpResponse::Ok().json(ViewPostResponse {
        success: true,
        first_view: viewed.first_view,
        post: post_response(viewed.post),
    }))
}

/// POST /api/posts/{id}/like
pub async fn like_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let like = deadline
        .run(state.posts.like_post(id, caller.as_str()))
        .await?;
    Ok(HttpResponse::Ok().json(LikePostResponse {
        success: true,
        liked: like.liked,
        total_likes: like.total_likes,
    }))
}

/// POST /api/posts/{id}/comments
pub async fn comment_post(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let id = parse_post_id(&path)?;
    let content = body.into_inner().content;
    let comment = deadline
        .run(state.posts.comment_post(id, caller.as_str(), content))
        .await?;
    Ok(HttpResponse::Created().json(comment_response(comment)))
}

/// GET /api/posts/{id}/comments
pub async fn list_comments(
    caller: CallerId,
    deadline: RequestDeadline,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListCommentsQuery>,
) -> AppResult<HttpResponse> {
    let post_id = parse_post_id(&path)?;
    let cmd = ListComments {
        post_id,
        page: query.page,
        page_size: query.page_size,
        requester_id: caller.into_inner(),
    };

    let page = deadline.run(state.posts.list_comments(cmd)).await?;
    Ok(HttpResponse::Ok().json(CommentListResponse {
        total_count: page.total_count,
        total_pages: page.total_pages,
        comments: page.items.into_iter().map(comment_response).collect(),
    }))
}
