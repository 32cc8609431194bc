//! Plan module: the catalogue of billable plans.
//!
//! The only module with an RPC surface; it reports `plans.v1.PlanService`
//! on the gRPC health service.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::PlansConfig;
use crate::grpc::GrpcServer;
use crate::http::HttpRouter;
use crate::modules::api::{ApiError, ListQuery};
use crate::modules::store::{new_id, Store};
use crate::modules::{Module, RegistrableWithRpc};

pub const NAME: &str = "plans";

/// Fully qualified gRPC service name.
pub const PLAN_SERVICE: &str = "plans.v1.PlanService";

/// Plans are small; a list call returns at most this many.
const MAX_RESULTS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price_cents: u64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub price_cents: u64,
    pub currency: Option<String>,
}

#[derive(Clone)]
struct PlansState {
    store: Arc<Store<Plan>>,
    currency: String,
}

pub struct PlanModule {
    state: PlansState,
}

impl PlanModule {
    pub fn new(config: &PlansConfig) -> Self {
        Self {
            state: PlansState {
                store: Arc::new(Store::new()),
                currency: config.currency.clone(),
            },
        }
    }
}

impl Module for PlanModule {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl RegistrableWithRpc for PlanModule {
    fn register_routes(&self, router: &mut HttpRouter, server: &mut GrpcServer) {
        router.merge(
            Router::new()
                .route("/plans", get(list_plans).post(create_plan))
                .route("/plans/{id}", get(get_plan))
                .with_state(self.state.clone()),
        );
        server.report_serving(PLAN_SERVICE);
    }
}

async fn list_plans(
    State(state): State<PlansState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Plan>> {
    Json(state.store.list(query.limit(MAX_RESULTS)))
}

async fn create_plan(
    State(state): State<PlansState>,
    Json(new): Json<NewPlan>,
) -> Result<(StatusCode, Json<Plan>), ApiError> {
    if new.name.trim().is_empty() {
        return Err(ApiError::Invalid("name must not be empty".into()));
    }

    let plan = Plan {
        id: new_id(),
        name: new.name,
        price_cents: new.price_cents,
        currency: new.currency.unwrap_or_else(|| state.currency.clone()),
    };
    state.store.insert(plan.id.clone(), plan.clone());
    tracing::debug!(plan_id = %plan.id, "Plan created");

    Ok((StatusCode::CREATED, Json(plan)))
}

async fn get_plan(
    State(state): State<PlansState>,
    Path(id): Path<String>,
) -> Result<Json<Plan>, ApiError> {
    state.store.get(&id).map(Json).ok_or(ApiError::NotFound("plan"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn registers_on_both_transports() {
        let mut http = HttpRouter::new(Duration::from_secs(5));
        let mut grpc = GrpcServer::new();
        let config = PlansConfig {
            currency: "EUR".into(),
        };
        PlanModule::new(&config).register_routes(&mut http, &mut grpc);

        assert_eq!(grpc.services(), [PLAN_SERVICE]);

        let response = http
            .into_router()
            .oneshot(
                Request::post("/plans")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"Pro","price_cents":1900}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let plan: Plan = serde_json::from_slice(&body).unwrap();
        assert_eq!(plan.currency, "EUR");
    }
}
