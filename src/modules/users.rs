//! User module: account records over REST.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::UsersConfig;
use crate::http::HttpRouter;
use crate::modules::api::{ApiError, ListQuery};
use crate::modules::store::{new_id, Store};
use crate::modules::{Module, Registrable};

pub const NAME: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
struct UsersState {
    store: Arc<Store<User>>,
    max_results: usize,
}

pub struct UserModule {
    state: UsersState,
}

impl UserModule {
    pub fn new(config: &UsersConfig) -> Self {
        Self {
            state: UsersState {
                store: Arc::new(Store::new()),
                max_results: config.max_results,
            },
        }
    }
}

impl Module for UserModule {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl Registrable for UserModule {
    fn register_routes(&self, router: &mut HttpRouter) {
        router.merge(
            Router::new()
                .route("/users", get(list_users).post(create_user))
                .route("/users/{id}", get(get_user))
                .with_state(self.state.clone()),
        );
    }
}

async fn list_users(
    State(state): State<UsersState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<User>> {
    Json(state.store.list(query.limit(state.max_results)))
}

async fn create_user(
    State(state): State<UsersState>,
    Json(new): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::Invalid("name must not be empty".into()));
    }
    if !new.email.contains('@') {
        return Err(ApiError::Invalid(format!("invalid email: {}", new.email)));
    }

    let user = User {
        id: new_id(),
        name: new.name,
        email: new.email,
    };
    state.store.insert(user.id.clone(), user.clone());
    tracing::debug!(user_id = %user.id, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<UsersState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    state.store.get(&id).map(Json).ok_or(ApiError::NotFound("user"))
}
