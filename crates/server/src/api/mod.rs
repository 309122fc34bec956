pub mod activities;
pub mod bookings;
pub mod customers;
pub mod hal;
pub mod health;
pub mod invoices;
pub mod openapi;
pub mod projects;
pub mod schemas;
pub mod token;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::handler::Handler;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use restvoice_core::usecase::{
    Activities, ActivitiesPort, CreateActivity, CreateActivityPort, CreateBooking,
    CreateBookingPort, CreateCustomer, CreateCustomerPort, CreateInvoice, CreateInvoicePort,
    CreateProject, CreateProjectPort, CreateRate, CreateRatePort, Customers, CustomersPort,
    DeleteBooking, DeleteBookingPort, GetInvoice, GetInvoicePort, InvoiceOwnership,
    InvoiceOwnershipPort, Projects, ProjectsPort, UpdateInvoice, UpdateInvoicePort,
};

use crate::auth::gate::require_ownership;
use crate::auth::oauth::require_code_grant;
use crate::auth::{
    AuthLayer, Challenge, KeyStore, OAuthExchange, Role, RoleLayer, TokenVerifier,
};
use crate::config::{AuthConfig, TokenMode};
use crate::error::ServerError;

use self::openapi::ApiDoc;

/// Every use case the HTTP layer can run.
#[derive(Clone)]
pub struct UseCases {
    pub create_activity: CreateActivity,
    pub activities: Activities,
    pub create_booking: CreateBooking,
    pub delete_booking: DeleteBooking,
    pub create_customer: CreateCustomer,
    pub customers: Customers,
    pub create_project: CreateProject,
    pub projects: Projects,
    pub create_rate: CreateRate,
    pub create_invoice: CreateInvoice,
    pub get_invoice: GetInvoice,
    pub update_invoice: UpdateInvoice,
    pub ownership: InvoiceOwnership,
}

impl UseCases {
    /// Wire every use case to the same repository.
    pub fn new<R>(repo: &Arc<R>) -> Self
    where
        R: ActivitiesPort
            + CreateActivityPort
            + CreateBookingPort
            + DeleteBookingPort
            + CreateCustomerPort
            + CustomersPort
            + CreateProjectPort
            + ProjectsPort
            + CreateRatePort
            + CreateInvoicePort
            + GetInvoicePort
            + UpdateInvoicePort
            + InvoiceOwnershipPort
            + 'static,
    {
        Self {
            create_activity: CreateActivity::new(repo.clone()),
            activities: Activities::new(repo.clone()),
            create_booking: CreateBooking::new(repo.clone()),
            delete_booking: DeleteBooking::new(repo.clone()),
            create_customer: CreateCustomer::new(repo.clone()),
            customers: Customers::new(repo.clone()),
            create_project: CreateProject::new(repo.clone()),
            projects: Projects::new(repo.clone()),
            create_rate: CreateRate::new(repo.clone()),
            create_invoice: CreateInvoice::new(repo.clone()),
            get_invoice: GetInvoice::new(repo.clone()),
            update_invoice: UpdateInvoice::new(repo.clone()),
            ownership: InvoiceOwnership::new(repo.clone()),
        }
    }
}

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub usecases: UseCases,
    /// Signing key cache (None unless RS256 tokens are verified).
    pub keys: Option<Arc<KeyStore>>,
    /// Token verifier (None when authentication is disabled).
    pub verifier: Option<Arc<TokenVerifier>>,
    /// Access code exchange with the identity provider.
    pub oauth: Arc<OAuthExchange>,
    /// Challenge sent with 401 and 406 responses from the auth gates.
    pub challenge: Challenge,
    /// Status for authenticated callers lacking a required role.
    pub insufficient_role: StatusCode,
}

impl AppState {
    /// Build the authentication collaborators described by `auth`.
    pub fn from_config(auth: &AuthConfig, usecases: UseCases) -> Result<Self, ServerError> {
        let challenge = match auth.mode {
            TokenMode::Rs256 => Challenge::bearer(&auth.realm),
            TokenMode::Hs256 => Challenge::basic(&auth.realm),
        };
        let insufficient_role = if auth.forbid_insufficient_role {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::UNAUTHORIZED
        };
        let oauth = OAuthExchange::new(auth).map_err(|e| ServerError::Config(e.to_string()))?;

        if auth.enabled && auth.client_id.is_empty() {
            return Err(ServerError::Config(
                "auth.client_id is required, it is the expected token audience".to_owned(),
            ));
        }

        let (keys, verifier) = if auth.enabled {
            match auth.mode {
                TokenMode::Rs256 => {
                    let keys = Arc::new(
                        KeyStore::new(
                            auth.jwks_url.clone(),
                            auth.public_key_url.clone(),
                            Duration::from_secs(auth.http_timeout_seconds),
                        )
                        .map_err(|e| ServerError::Config(e.to_string()))?,
                    );
                    let verifier = TokenVerifier::rs256(
                        Arc::clone(&keys),
                        auth.issuer.clone(),
                        auth.client_id.clone(),
                    );
                    (Some(keys), Some(verifier))
                }
                TokenMode::Hs256 => {
                    let secret = auth
                        .shared_secret
                        .as_deref()
                        .filter(|s| !s.is_empty())
                        .ok_or_else(|| {
                            ServerError::Config(
                                "auth.shared_secret is required in hs256 mode".to_owned(),
                            )
                        })?;
                    let verifier = TokenVerifier::hs256(
                        secret.as_bytes(),
                        auth.issuer.clone(),
                        auth.client_id.clone(),
                    );
                    (None, Some(verifier))
                }
            }
        } else {
            (None, None)
        };

        Ok(Self {
            usecases,
            keys,
            verifier: verifier.map(|v| Arc::new(v.with_leeway(auth.leeway_seconds))),
            oauth: Arc::new(oauth),
            challenge,
            insufficient_role,
        })
    }
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let admin = RoleLayer::new(
        Role::Admin,
        state.insufficient_role,
        state.challenge.clone(),
    );

    let public = Router::new()
        .route("/health", get(health::health))
        // Redirect target of the identity provider's login page
        .route(
            "/auth/token",
            get(token::exchange_token).route_layer(middleware::from_fn_with_state(
                state.challenge.clone(),
                require_code_grant,
            )),
        );

    // Routes addressing a single invoice require the caller to own it.
    let owned = Router::new()
        .route(
            "/customers/{customer_id}/invoices/{invoice_id}",
            get(invoices::get_invoice).put(invoices::update_invoice),
        )
        .route(
            "/customers/{customer_id}/invoices/{invoice_id}/bookings",
            post(bookings::create_booking),
        )
        .route(
            "/customers/{customer_id}/invoices/{invoice_id}/bookings/{booking_id}",
            delete(bookings::delete_booking),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_ownership,
        ));

    let protected = Router::new()
        .route(
            "/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/customers",
            get(customers::list_customers.layer(admin)).post(customers::create_customer),
        )
        .route(
            "/customers/{customer_id}/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/customers/{customer_id}/projects/{project_id}/rates",
            post(projects::create_rate),
        )
        .route(
            "/customers/{customer_id}/invoices",
            post(invoices::create_invoice),
        )
        .merge(owned)
        .route_layer(AuthLayer::new(
            state.verifier.clone(),
            state.challenge.clone(),
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `201 Created` pointing at `{request path}/{id}`.
pub(crate) fn created<T: serde::Serialize>(uri: &Uri, id: u64, body: T) -> Response {
    let location = format!("{}/{id}", uri.path().trim_end_matches('/'));
    let mut response = (StatusCode::CREATED, axum::Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}
