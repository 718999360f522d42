use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use crate::{
    config::PoolSettings,
    db::handlers::{PostRepository, Posts, UserRepository, Users},
};

/// A backend that can hand out a repository for each resource kind.
pub trait Store: Clone + Send + Sync + 'static {
    type Users: UserRepository;
    type Posts: PostRepository;

    fn users(&self) -> &Self::Users;
    fn posts(&self) -> &Self::Posts;
}

/// PostgreSQL store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    users: Users,
    posts: Posts,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: Users::new(pool.clone()),
            posts: Posts::new(pool.clone()),
            pool,
        }
    }

    /// Connect to `url` and apply pending migrations.
    pub async fn connect(url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout);
        if let Some(idle) = settings.idle_timeout {
            options = options.idle_timeout(idle);
        }

        let pool = options.connect(url).await?;
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        info!("Closing database connections...");
        self.pool.close().await;
    }
}

impl Store for PgStore {
    type Users = Users;
    type Posts = Posts;

    fn users(&self) -> &Users {
        &self.users
    }

    fn posts(&self) -> &Posts {
        &self.posts
    }
}
