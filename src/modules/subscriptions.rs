//! Subscription module: binds users to plans.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::SubscriptionsConfig;
use crate::http::HttpRouter;
use crate::modules::api::{ApiError, ListQuery};
use crate::modules::store::{new_id, Store};
use crate::modules::{Module, Registrable};

pub const NAME: &str = "subscriptions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub plan_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NewSubscription {
    pub user_id: String,
    pub plan_id: String,
}

#[derive(Clone)]
struct SubscriptionsState {
    store: Arc<Store<Subscription>>,
    max_results: usize,
}

pub struct SubscriptionModule {
    state: SubscriptionsState,
}

impl SubscriptionModule {
    pub fn new(config: &SubscriptionsConfig) -> Self {
        Self {
            state: SubscriptionsState {
                store: Arc::new(Store::new()),
                max_results: config.max_results,
            },
        }
    }
}

impl Module for SubscriptionModule {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl Registrable for SubscriptionModule {
    fn register_routes(&self, router: &mut HttpRouter) {
        router.merge(
            Router::new()
                .route("/subscriptions", get(list_subscriptions).post(create_subscription))
                .route("/subscriptions/{id}", get(get_subscription))
                .with_state(self.state.clone()),
        );
    }
}

async fn list_subscriptions(
    State(state): State<SubscriptionsState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Subscription>> {
    Json(state.store.list(query.limit(state.max_results)))
}

async fn create_subscription(
    State(state): State<SubscriptionsState>,
    Json(new): Json<NewSubscription>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    if new.user_id.trim().is_empty() || new.plan_id.trim().is_empty() {
        return Err(ApiError::Invalid("user_id and plan_id are required".into()));
    }

    let subscription = Subscription {
        id: new_id(),
        user_id: new.user_id,
        plan_id: new.plan_id,
    };
    state
        .store
        .insert(subscription.id.clone(), subscription.clone());

    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn get_subscription(
    State(state): State<SubscriptionsState>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>, ApiError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or(ApiError::NotFound("subscription"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn router() -> Router {
        let mut http = HttpRouter::new(Duration::from_secs(5));
        SubscriptionModule::new(&SubscriptionsConfig { max_results: 1 }).register_routes(&mut http);
        http.into_router()
    }

    fn post(body: &str) -> Request<Body> {
        Request::post("/subscriptions")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_plan_is_rejected() {
        let response = router()
            .oneshot(post(r#"{"user_id":"u-1","plan_id":" "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_is_capped_by_max_results() {
        let app = router();
        for plan in ["basic", "pro"] {
            let body = format!(r#"{{"user_id":"u-1","plan_id":"{plan}"}}"#);
            let response = app.clone().oneshot(post(&body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = app
            .oneshot(Request::get("/subscriptions?limit=50").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let listed: Vec<Subscription> = serde_json::from_slice(&body).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].plan_id, "basic");
    }
}
