//! Payment module.
//!
//! Owns an outbound gRPC channel to the plan service, so it is the one
//! module with a shutdown operation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tonic::transport::{Channel, Endpoint};

use crate::config::PaymentsConfig;
use crate::http::HttpRouter;
use crate::modules::api::{ApiError, ListQuery};
use crate::modules::store::{new_id, Store};
use crate::modules::{Module, ModuleError, Registrable, Stoppable};

pub const NAME: &str = "payments";

const MAX_RESULTS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub subscription_id: String,
    pub amount_cents: u64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Captured,
}

#[derive(Debug, Deserialize)]
pub struct NewPayment {
    pub subscription_id: String,
    pub amount_cents: u64,
}

#[derive(Clone)]
struct PaymentsState {
    store: Arc<Store<Payment>>,
}

pub struct PaymentModule {
    state: PaymentsState,
    plans: Mutex<Option<Channel>>,
}

impl PaymentModule {
    /// Build the module and its (lazily connected) channel to the plan service.
    ///
    /// Must run inside a Tokio runtime.
    pub fn try_new(config: &PaymentsConfig) -> Result<Self, ModuleError> {
        let endpoint = Endpoint::from_shared(config.plans_endpoint.clone())
            .map_err(|e| ModuleError::Config {
                module: NAME,
                reason: format!("plans_endpoint {:?}: {e}", config.plans_endpoint),
            })?
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        Ok(Self {
            state: PaymentsState {
                store: Arc::new(Store::new()),
            },
            plans: Mutex::new(Some(endpoint.connect_lazy())),
        })
    }

    /// Whether the plan service channel is still held.
    pub fn has_upstream(&self) -> bool {
        self.plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Module for PaymentModule {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl Registrable for PaymentModule {
    fn register_routes(&self, router: &mut HttpRouter) {
        router.merge(
            Router::new()
                .route("/payments", get(list_payments).post(create_payment))
                .route("/payments/{id}", get(get_payment))
                .with_state(self.state.clone()),
        );
    }
}

impl Stoppable for PaymentModule {
    fn shutdown(&self) -> Result<(), ModuleError> {
        let channel = self
            .plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ModuleError::AlreadyStopped(NAME))?;

        drop(channel);
        tracing::info!(module = NAME, "Plan service channel closed");
        Ok(())
    }
}

async fn list_payments(
    State(state): State<PaymentsState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Payment>> {
    Json(state.store.list(query.limit(MAX_RESULTS)))
}

async fn create_payment(
    State(state): State<PaymentsState>,
    Json(new): Json<NewPayment>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    if new.subscription_id.trim().is_empty() {
        return Err(ApiError::Invalid("subscription_id must not be empty".into()));
    }
    if new.amount_cents == 0 {
        return Err(ApiError::Invalid("amount_cents must be positive".into()));
    }

    let payment = Payment {
        id: new_id(),
        subscription_id: new.subscription_id,
        amount_cents: new.amount_cents,
        status: PaymentStatus::Captured,
    };
    state.store.insert(payment.id.clone(), payment.clone());
    tracing::debug!(payment_id = %payment.id, "Payment captured");

    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_payment(
    State(state): State<PaymentsState>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    state.store.get(&id).map(Json).ok_or(ApiError::NotFound("payment"))
}
