pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod liqpay;
pub mod middleware;
pub mod ports;
pub mod secrets;
pub mod startup;
pub mod use_cases;
pub mod utils;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::{AllowedIps, Config, Secret};
use crate::health::DependencyChecker;
use crate::liqpay::LiqPay;
use crate::middleware::callback_allowlist::CallbackAllowlistLayer;
use crate::ports::{Notifier, RegistrationRepository};
use crate::use_cases::{CreateCheckout, ReconcilePayment};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn RegistrationRepository>,
    pub reconcile: Arc<ReconcilePayment>,
    pub checkout: Arc<CreateCheckout>,
    pub dependencies: Vec<Arc<dyn DependencyChecker>>,
    pub admin_api_key: Secret,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        liqpay: LiqPay,
        namespace: impl Into<String>,
        repository: Arc<dyn RegistrationRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let namespace = namespace.into();
        Self {
            reconcile: Arc::new(ReconcilePayment::new(
                liqpay.clone(),
                namespace.clone(),
                repository.clone(),
                notifier,
            )),
            checkout: Arc::new(CreateCheckout::new(liqpay, namespace, repository.clone())),
            repository,
            dependencies: Vec::new(),
            admin_api_key: Secret::default(),
            start_time: Instant::now(),
        }
    }

    pub fn with_checkout(mut self, checkout: CreateCheckout) -> Self {
        self.checkout = Arc::new(checkout);
        self
    }

    pub fn with_admin_key(mut self, key: Secret) -> Self {
        self.admin_api_key = key;
        self
    }

    pub fn with_dependency(mut self, checker: Arc<dyn DependencyChecker>) -> Self {
        self.dependencies.push(checker);
        self
    }
}

/// Router-level knobs that do not belong to the use cases.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub callback_allowed_ips: AllowedIps,
    pub trusted_proxy_depth: usize,
    pub cors_allowed_origins: Option<String>,
    pub log_request_body: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            callback_allowed_ips: AllowedIps::Any,
            trusted_proxy_depth: 0,
            cors_allowed_origins: None,
            log_request_body: false,
        }
    }
}

impl From<&Config> for HttpOptions {
    fn from(config: &Config) -> Self {
        Self {
            callback_allowed_ips: config.callback_allowed_ips.clone(),
            trusted_proxy_depth: config.trusted_proxy_depth,
            cors_allowed_origins: config.cors_allowed_origins.clone(),
            log_request_body: config.log_request_body,
        }
    }
}

fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origins.map(str::trim) {
        None | Some("") | Some("*") => cors.allow_origin(Any),
        Some(list) => {
            let origins: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
    }
}

pub fn create_app(state: AppState, options: HttpOptions) -> Router {
    let callback = Router::new()
        .route("/payments/callback", post(handlers::payments::callback))
        .layer(CallbackAllowlistLayer::new(
            options.callback_allowed_ips,
            options.trusted_proxy_depth,
        ));

    let admin = Router::new()
        .route(
            "/registrations/:id/payment",
            get(handlers::registrations::get_payment),
        )
        .route_layer(from_fn_with_state(
            state.admin_api_key.clone(),
            middleware::auth::admin_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/payments/checkout", post(handlers::payments::create_checkout))
        .merge(callback)
        .merge(admin)
        .layer(cors_layer(options.cors_allowed_origins.as_deref()))
        .layer(from_fn_with_state(
            options.log_request_body,
            middleware::request_logger::request_logger_middleware,
        ))
        .with_state(state)
}
