//! OpenAPI documentation for the HTTP API, served at `/api-docs/openapi.json` and browsable at
//! `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{
    api::{
        self,
        models::{
            auth::{LoginRequest, RegisterRequest},
            posts::{PostRequest, PostResponse},
            users::Identity,
        },
    },
    db::models::posts::PostCategory,
    errors::ErrorBody,
};

/// Name of the session cookie in the published schema. Deployments may rename the cookie.
const DOCUMENTED_COOKIE_NAME: &str = "blogd_session";

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    DOCUMENTED_COOKIE_NAME,
                    "HttpOnly session cookie set by `/auth/register` and `/auth/login`",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "blogd API", description = "Blog backend with cookie sessions and owner-only post mutation"),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::health::healthz,
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::posts::list_posts,
        api::handlers::posts::list_my_posts,
        api::handlers::posts::get_post,
        api::handlers::posts::create_post,
        api::handlers::posts::update_post,
        api::handlers::posts::delete_post,
    ),
    components(schemas(Identity, ErrorBody, RegisterRequest, LoginRequest, PostRequest, PostResponse, PostCategory)),
    tags(
        (name = "authentication", description = "Registration and cookie sessions"),
        (name = "posts", description = "Blog posts; mutation is restricted to the author"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
