//! JSON API over the post repository

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::content::{Post, PostDraft, PostEntry};
use crate::query::{ContentQuery, TermCount};
use crate::repository::PostRepository;
use crate::{Blog, Error};

/// Server state
struct ServerState {
    repository: PostRepository,
}

type SharedState = Arc<ServerState>;

/// Error body returned by every handler
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(what: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: what.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidPost(_) => StatusCode::BAD_REQUEST,
            Error::SlugConflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the API router
pub fn router(repository: PostRepository) -> Router {
    let state = Arc::new(ServerState { repository });

    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/:slug",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/categories", get(category_index))
        .route("/api/categories/:name", get(category_posts))
        .route("/api/tags", get(tag_index))
        .route("/api/tags/:name", get(tag_posts))
        .route("/api/fix-posts", get(fix_posts))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let app = router(blog.repository.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("{} API running at http://{}:{}/api/posts", blog.config.title, ip, port);
    if !blog.config.description.is_empty() {
        println!("{}", blog.config.description);
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load_query(state: &ServerState) -> ApiResult<ContentQuery> {
    Ok(ContentQuery::load(&state.repository).await?)
}

/// Unparseable files are served as their placeholder post
async fn list_posts(State(state): State<SharedState>) -> ApiResult<Json<Vec<Post>>> {
    let entries = state.repository.list().await?;
    Ok(Json(
        entries.into_iter().map(PostEntry::into_placeholder).collect(),
    ))
}

async fn get_post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Post>> {
    state
        .repository
        .get_by_slug(&slug)
        .await
        .map(|entry| Json(entry.into_placeholder()))
        .ok_or_else(|| ApiError::not_found(format!("post `{}` not found", slug)))
}

async fn create_post(
    State(state): State<SharedState>,
    Json(draft): Json<PostDraft>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let slug = state.repository.create(draft).await?;
    Ok((StatusCode::CREATED, Json(json!({ "slug": slug }))))
}

async fn update_post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Json(draft): Json<PostDraft>,
) -> ApiResult<Json<Value>> {
    let slug = state.repository.update(&slug, draft).await?;
    Ok(Json(json!({ "slug": slug })))
}

async fn delete_post(State(state): State<SharedState>, Path(slug): Path<String>) -> Json<Value> {
    let deleted = state.repository.delete(&slug).await;
    Json(json!({ "deleted": deleted }))
}

async fn category_index(State(state): State<SharedState>) -> ApiResult<Json<Vec<TermCount>>> {
    Ok(Json(load_query(&state).await?.category_counts()))
}

async fn category_posts(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    let query = load_query(&state).await?;
    let posts: Vec<Post> = query.by_category(&name).into_iter().cloned().collect();
    if posts.is_empty() {
        return Err(ApiError::not_found(format!("category `{}` not found", name)));
    }
    Ok(Json(posts))
}

async fn tag_index(State(state): State<SharedState>) -> ApiResult<Json<Vec<TermCount>>> {
    Ok(Json(load_query(&state).await?.tag_counts()))
}

async fn tag_posts(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    let query = load_query(&state).await?;
    let posts: Vec<Post> = query.by_tag(&name).into_iter().cloned().collect();
    if posts.is_empty() {
        return Err(ApiError::not_found(format!("tag `{}` not found", name)));
    }
    Ok(Json(posts))
}

async fn fix_posts(State(state): State<SharedState>) -> (StatusCode, Json<Value>) {
    match state.repository.repair_all().await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": report.summary(),
                "results": report.results,
            })),
        ),
        Err(e) => {
            tracing::error!("Error fixing posts: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Error fixing posts",
                    "error": e.to_string(),
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryObjectStore, PostStorage, RemoteStorage};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (PostRepository, Router) {
        let store = MemoryObjectStore::new();
        let repository = PostRepository::new(Arc::new(RemoteStorage::new(
            Arc::new(store),
            "posts/",
        )));
        (repository.clone(), router(repository))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let (_repo, app) = app();

        let (status, body) = send(
            &app,
            "POST",
            "/api/posts",
            Some(json!({ "title": "Hello, World!", "content": "Body", "tags": ["Rust"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "hello-world");

        let (status, body) = send(&app, "GET", "/api/posts/hello-world", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Hello, World!");

        let (status, body) = send(&app, "GET", "/api/posts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_post_is_404() {
        let (_repo, app) = app();
        let (status, body) = send(&app, "GET", "/api/posts/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_write_errors_map_to_status() {
        let (_repo, app) = app();
        let (status, _) = send(&app, "POST", "/api/posts", Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(&app, "POST", "/api/posts", Some(json!({ "title": "Dup" }))).await;
        let (status, _) = send(&app, "POST", "/api/posts", Some(json!({ "title": "Dup" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (repo, app) = app();
        repo.create(PostDraft::new("Foo", "a")).await.unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            "/api/posts/foo",
            Some(json!({ "title": "Bar", "content": "b" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "bar");
        assert!(repo.get_by_slug("foo").await.is_none());

        let (_, body) = send(&app, "DELETE", "/api/posts/bar", None).await;
        assert_eq!(body["deleted"], true);
        assert!(repo.get_by_slug("bar").await.is_none());
    }

    #[tokio::test]
    async fn test_taxonomy_routes() {
        let (repo, app) = app();
        let mut draft = PostDraft::new("One", "1");
        draft.category = Some("News".to_string());
        draft.tags = vec!["React".to_string()];
        repo.create(draft).await.unwrap();

        let (status, body) = send(&app, "GET", "/api/categories/news", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["slug"], "one");

        let (status, _) = send(&app, "GET", "/api/categories/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, "GET", "/api/tags", None).await;
        assert_eq!(body[0]["name"], "React");
        assert_eq!(body[0]["count"], 1);

        let (_, body) = send(&app, "GET", "/api/tags/REACT", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, "GET", "/api/tags/vue", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_broken_post_served_as_placeholder() {
        let (repo, app) = app();
        repo.storage()
            .write("broken.md", "---\ntitle: [oops\n---\n\nbody")
            .await
            .unwrap();

        let (status, body) = send(&app, "GET", "/api/posts/broken", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Error Loading Post");

        let (_, body) = send(&app, "GET", "/api/posts", None).await;
        assert_eq!(body[0]["slug"], "broken");
    }

    #[tokio::test]
    async fn test_fix_posts() {
        let (repo, app) = app();
        repo.storage()
            .write("broken.md", "---\ntitle: My: Title\n---\n\nbody")
            .await
            .unwrap();

        let (status, body) = send(&app, "GET", "/api/fix-posts", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Fixed 1 of 1 posts");
        assert_eq!(body["results"][0]["slug"], "broken");
        assert_eq!(body["results"][0]["fixed"], true);
    }
}
