// ABOUTME: Shared application state handed to every handler
// ABOUTME: Wires the domain services over one connection pool

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info_span;

use slips_auth::{DetachedTasks, IdentityResolver, JwtVerifier};
use slips_security::{TokenStorage, UserStorage};
use slips_tags::TagStorage;
use slips_tasks::{TaskService, TaskStorage};

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskService>,
    pub tags: Arc<TagStorage>,
    pub tokens: Arc<TokenStorage>,
    pub users: Arc<UserStorage>,
    pub resolver: Arc<IdentityResolver>,
}

impl AppState {
    /// Build every service on `pool`. Last-used updates run on `detached`.
    pub fn new(pool: SqlitePool, verifier: JwtVerifier, detached: DetachedTasks) -> Self {
        let tags = Arc::new(TagStorage::new(pool.clone(), info_span!("tags")));
        let tokens = Arc::new(TokenStorage::new(pool.clone(), info_span!("api_tokens")));
        let users = Arc::new(UserStorage::new(pool.clone(), info_span!("users")));
        let tasks = Arc::new(TaskService::new(
            TaskStorage::new(pool),
            tags.clone(),
            info_span!("tasks"),
        ));
        let resolver = Arc::new(IdentityResolver::new(
            verifier,
            tokens.clone(),
            detached,
            info_span!("identity"),
        ));

        Self {
            tasks,
            tags,
            tokens,
            users,
            resolver,
        }
    }
}
