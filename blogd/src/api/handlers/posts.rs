use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::instrument;

use crate::{
    AppState,
    api::{
        models::{
            posts::{PostRequest, PostResponse},
            users::Identity,
        },
        validation::{FieldErrors, Validate, parse_id},
    },
    auth::{current_user::MaybeIdentity, ownership::authorize_existing},
    db::{
        handlers::Repository,
        models::posts::{PostCreateDBRequest, PostFilter, PostUpdateDBRequest},
        store::Store,
    },
    errors::{Error, ErrorBody},
    types::{Operation, abbrev_uuid},
};

/// List all posts, most recently updated first
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    responses(
        (status = 200, description = "All posts", body = [PostResponse]),
    )
)]
#[instrument(skip_all)]
pub async fn list_posts<S: Store>(
    State(state): State<AppState<S>>,
    MaybeIdentity(viewer): MaybeIdentity,
) -> Result<Json<Vec<PostResponse>>, Error> {
    let posts = state.store.posts().list(&PostFilter::default()).await?;
    tracing::debug!(
        count = posts.len(),
        viewer = %viewer.as_ref().map(|v| abbrev_uuid(&v.id)).unwrap_or_else(|| "anonymous".to_string()),
        "Listing posts"
    );
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// List the caller's own posts, most recently updated first
#[utoipa::path(
    get,
    path = "/posts/me",
    tag = "posts",
    responses(
        (status = 200, description = "Posts authored by the caller", body = [PostResponse]),
        (status = 401, description = "No valid session", body = ErrorBody),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&identity.id)))]
pub async fn list_my_posts<S: Store>(State(state): State<AppState<S>>, identity: Identity) -> Result<Json<Vec<PostResponse>>, Error> {
    let posts = state.store.posts().list(&PostFilter::by_author(identity.id)).await?;
    Ok(Json(posts.into_iter().map(Into::into).collect()))
}

/// Get a single post
#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID (UUID)")),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 400, description = "`{\"id\": message}` when the ID is not a UUID"),
        (status = 404, description = "No such post", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn get_post<S: Store>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<PostResponse>, Error> {
    let id = parse_id(&id)?;

    let post = state.store.posts().get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Post".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(post.into()))
}

/// Create a post authored by the caller
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Field -> message map"),
        (status = 401, description = "No valid session", body = ErrorBody),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&identity.id)))]
pub async fn create_post<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostResponse>), Error> {
    let Json(request) = payload?;
    let input = request.validate()?;

    let post = state
        .store
        .posts()
        .create(&PostCreateDBRequest {
            user_id: identity.id,
            title: input.title,
            content: input.content,
            category: input.category,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

/// Replace a post's title, content and category. Owner only.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID (UUID)")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "The updated post", body = PostResponse),
        (status = 400, description = "Field -> message map covering `id` and the body"),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 403, description = "Caller is not the author", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&identity.id)))]
pub async fn update_post<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<Json<PostResponse>, Error> {
    let Json(request) = payload?;

    let (id, input) = match (parse_id(&id), request.validate()) {
        (Ok(id), Ok(input)) => (id, input),
        (id, input) => {
            let mut errors = FieldErrors::default();
            if let Err(e) = id {
                errors.merge(e);
            }
            if let Err(e) = input {
                errors.merge(e);
            }
            return Err(errors.into());
        }
    };

    let posts = state.store.posts();
    authorize_existing(&identity, posts.get_by_id(id).await?, id, Operation::Update)?;

    let post = posts
        .update(
            id,
            &PostUpdateDBRequest {
                title: Some(input.title),
                content: Some(input.content),
                category: Some(input.category),
            },
        )
        .await?;

    Ok(Json(post.into()))
}

/// Delete a post. Owner only.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID (UUID)")),
    responses(
        (status = 200, description = "Deleted", body = String),
        (status = 400, description = "`{\"id\": message}` when the ID is not a UUID"),
        (status = 401, description = "No valid session", body = ErrorBody),
        (status = 403, description = "Caller is not the author", body = ErrorBody),
        (status = 404, description = "No such post", body = ErrorBody),
    ),
    security(("CookieAuth" = []))
)]
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&identity.id)))]
pub async fn delete_post<S: Store>(
    State(state): State<AppState<S>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<&'static str, Error> {
    let id = parse_id(&id)?;

    let posts = state.store.posts();
    authorize_existing(&identity, posts.get_by_id(id).await?, id, Operation::Delete)?;

    if !posts.delete(id).await? {
        return Err(Error::NotFound {
            resource: "Post".to_string(),
            id: id.to_string(),
        });
    }

    Ok("Success")
}

#[cfg(test)]
mod tests {
    use crate::test::utils::{create_post, create_test_server, register_user, session_cookie};
    use axum::http::{StatusCode, header};
    use serde_json::{Value, json};
    use uuid::Uuid;

    fn post_body(title: &str, category: &str) -> Value {
        json!({ "title": title, "content": format!("{title} content"), "category": category })
    }

    #[test_log::test(tokio::test)]
    async fn test_list_posts_is_public_and_newest_first() {
        let server = create_test_server();
        let user = register_user(&server, "a@x.com", "A").await;
        create_post(&server, &user, post_body("Title 1", "Education")).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        create_post(&server, &user, post_body("Title 2", "Sport")).await;

        let response = server.get("/posts").await;
        response.assert_status_ok();
        let body: Vec<Value> = response.json();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0]["title"], "Title 2");
        assert_eq!(body[0]["category"], "Sport");
        assert_eq!(body[1]["title"], "Title 1");
        assert_eq!(body[1]["user"]["email"], "a@x.com");
        assert!(body[1]["createdAt"].is_string());
        assert!(body[1]["updatedAt"].is_string());
    }

    #[test_log::test(tokio::test)]
    async fn test_invalid_cookie_does_not_block_public_routes() {
        let server = create_test_server();
        server
            .get("/posts")
            .add_header(header::COOKIE, "blogd_session=not-a-token")
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_stale_duplicate_cookie_does_not_hide_a_valid_session() {
        let server = create_test_server();
        let user = register_user(&server, "a@x.com", "A").await;
        create_post(&server, &user, post_body("Mine", "Sport")).await;

        let response = server
            .get("/posts/me")
            .add_header(header::COOKIE, format!("blogd_session=stale; {}", session_cookie(&user)))
            .await;
        response.assert_status_ok();
        let body: Vec<Value> = response.json();
        assert_eq!(body.len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_list_my_posts() {
        let server = create_test_server();
        let alice = register_user(&server, "alice@x.com", "Alice").await;
        let bob = register_user(&server, "bob@x.com", "Bob").await;
        create_post(&server, &alice, post_body("Alice's", "Politics")).await;
        create_post(&server, &bob, post_body("Bob's", "Sport")).await;

        let response = server.get("/posts/me").add_header(header::COOKIE, session_cookie(&alice)).await;
        response.assert_status_ok();
        let body: Vec<Value> = response.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["title"], "Alice's");

        server.get("/posts/me").await.assert_status_unauthorized();
    }

    #[test_log::test(tokio::test)]
    async fn test_get_post() {
        let server = create_test_server();
        let user = register_user(&server, "a@x.com", "A").await;
        let post = create_post(&server, &user, post_body("Hello", "Education")).await;

        let response = server.get(&format!("/posts/{}", post["id"].as_str().unwrap())).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Hello");

        let response = server.get("/posts/not-a-uuid").await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body.get("id").is_some());

        let response = server.get(&format!("/posts/{}", Uuid::new_v4())).await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "Post not found");
    }

    #[test_log::test(tokio::test)]
    async fn test_create_post() {
        let server = create_test_server();
        let user = register_user(&server, "a@x.com", "A").await;

        let response = server
            .post("/posts")
            .add_header(header::COOKIE, session_cookie(&user))
            .json(&post_body("Title", "Education"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        for key in ["id", "title", "content", "category", "createdAt", "updatedAt", "user"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }
        assert_eq!(body["user"]["id"], user.id.to_string());
    }

    #[test_log::test(tokio::test)]
    async fn test_create_post_validation_and_auth() {
        let server = create_test_server();
        let user = register_user(&server, "a@x.com", "A").await;

        let response = server
            .post("/posts")
            .add_header(header::COOKIE, session_cookie(&user))
            .json(&json!({ "category": "Cooking" }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        for key in ["title", "content", "category"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }

        // The guard runs before validation
        let response = server.post("/posts").json(&json!({})).await;
        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert_eq!(body["statusCode"], 401);
    }

    #[test_log::test(tokio::test)]
    async fn test_mistyped_post_fields_are_reported_per_field() {
        let server = create_test_server();
        let user = register_user(&server, "a@x.com", "A").await;

        let response = server
            .post("/posts")
            .add_header(header::COOKIE, session_cookie(&user))
            .json(&json!({ "title": 5, "content": "Body", "category": "Sport" }))
            .await;
        response.assert_status_bad_request();
        response.assert_json(&json!({ "title": "Title must be a string" }));

        let post = create_post(&server, &user, post_body("Kept", "Sport")).await;
        let response = server
            .put(&format!("/posts/{}", post["id"].as_str().unwrap()))
            .add_header(header::COOKIE, session_cookie(&user))
            .json(&json!({ "title": "Edited", "content": false, "category": null }))
            .await;
        response.assert_status_bad_request();
        response.assert_json(&json!({
            "content": "Content must be a string",
            "category": "Category must be one of Education, Sport, Politics",
        }));

        let posts: Vec<Value> = server.get("/posts").await.json();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["title"], "Kept");
    }

    #[test_log::test(tokio::test)]
    async fn test_update_post_check_order() {
        let server = create_test_server();
        let owner = register_user(&server, "owner@x.com", "Owner").await;
        let other = register_user(&server, "other@x.com", "Other").await;
        let post = create_post(&server, &owner, post_body("Original", "Education")).await;
        let path = format!("/posts/{}", post["id"].as_str().unwrap());
        let update = post_body("Edited", "Politics");

        // 401 without a session
        let response = server.put(&path).json(&update).await;
        response.assert_status_unauthorized();

        // 400 with every failing field, id included
        let response = server
            .put("/posts/nope")
            .add_header(header::COOKIE, session_cookie(&owner))
            .json(&json!({ "title": "" }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        for key in ["id", "title", "content", "category"] {
            assert!(body.get(key).is_some(), "missing {key}");
        }

        // 404 for a well-formed id that does not exist, even for a non-owner
        let response = server
            .put(&format!("/posts/{}", Uuid::new_v4()))
            .add_header(header::COOKIE, session_cookie(&other))
            .json(&update)
            .await;
        response.assert_status_not_found();

        // 403 for someone else's post
        let response = server
            .put(&path)
            .add_header(header::COOKIE, session_cookie(&other))
            .json(&update)
            .await;
        response.assert_status_forbidden();
        let body: Value = response.json();
        assert_eq!(body["statusCode"], 403);
        assert_eq!(body["error"], "Forbidden");

        // Unchanged after the refused attempt
        let body: Value = server.get(&path).await.json();
        assert_eq!(body["title"], "Original");

        // 200 for the owner, and the store reflects it
        let response = server
            .put(&path)
            .add_header(header::COOKIE, session_cookie(&owner))
            .json(&update)
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Edited");
        assert_eq!(body["category"], "Politics");

        let body: Value = server.get(&path).await.json();
        assert_eq!(body["title"], "Edited");
        assert_eq!(body["content"], "Edited content");
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_post_check_order() {
        let server = create_test_server();
        let owner = register_user(&server, "owner@x.com", "Owner").await;
        let other = register_user(&server, "other@x.com", "Other").await;
        let post = create_post(&server, &owner, post_body("Doomed", "Sport")).await;
        let path = format!("/posts/{}", post["id"].as_str().unwrap());

        server.delete(&path).await.assert_status_unauthorized();

        let response = server
            .delete("/posts/123")
            .add_header(header::COOKIE, session_cookie(&owner))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body.get("id").is_some());

        server
            .delete(&format!("/posts/{}", Uuid::new_v4()))
            .add_header(header::COOKIE, session_cookie(&owner))
            .await
            .assert_status_not_found();

        server
            .delete(&path)
            .add_header(header::COOKIE, session_cookie(&other))
            .await
            .assert_status_forbidden();
        server.get(&path).await.assert_status_ok();

        let response = server.delete(&path).add_header(header::COOKIE, session_cookie(&owner)).await;
        response.assert_status_ok();
        assert!(response.text().to_lowercase().contains("success"));

        server.get(&path).await.assert_status_not_found();
        // Deleting again is a 404, not a 403
        server
            .delete(&path)
            .add_header(header::COOKIE, session_cookie(&other))
            .await
            .assert_status_not_found();
    }
}
