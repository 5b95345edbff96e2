use crate::auth;
use crate::handlers::{
    admin, availability, contact, events, fellowship, hosts, locations, messaging, payments,
    ratings, speakers, uploads,
};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

async fn health() -> impl IntoResponse {
    "OK"
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup/request", post(auth::signup_request))
        .route("/signup/verify", post(auth::signup_verify))
        .route("/signup/password", post(auth::signup_password))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/password/forgot", post(auth::forgot_password))
        .route("/password/reset", post(auth::reset_password))
        .route("/otp/resend", post(auth::resend_otp))
        .route("/email/check", post(auth::email_check))
        .route("/me", get(auth::me))
}

fn fellowship_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(fellowship::signup))
        .route("/registration", post(fellowship::upsert_registration))
        .route("/status/:mobile", get(fellowship::funnel_status))
        .route(
            "/videos/:mobile",
            get(fellowship::video_status).put(fellowship::update_video_status),
        )
        .route("/tasks/task1", post(fellowship::submit_task1))
        .route("/tasks/task2", post(fellowship::submit_task2))
        .route(
            "/acceptance/:mobile",
            get(fellowship::acceptance_status).put(fellowship::update_acceptance),
        )
        .route("/consents/:mobile", put(fellowship::update_consents))
        .route("/testimonials", post(fellowship::create_testimonial))
        .route("/testimonials/:mobile", get(fellowship::list_testimonials))
        .route("/attendance", post(fellowship::record_attendance))
        .route("/attendance/:mobile", get(fellowship::list_attendance))
}

fn marketplace_routes() -> Router<AppState> {
    Router::new()
        .route("/speakers", get(speakers::list_speakers))
        .route(
            "/speakers/me/profile",
            get(speakers::my_profile).put(speakers::update_my_profile),
        )
        .route("/speakers/me/dashboard", get(speakers::dashboard))
        .route("/speakers/me/events", get(speakers::my_events))
        .route("/speakers/:id", get(speakers::get_speaker))
        .route(
            "/speakers/:id/availability",
            get(availability::speaker_availability),
        )
        .route("/speakers/:id/ratings", get(ratings::speaker_ratings))
        .route("/availability", put(availability::set_availability))
        .route(
            "/hosts/me/profile",
            get(hosts::my_profile).put(hosts::update_my_profile),
        )
        .route("/hosts/me/dashboard", get(hosts::dashboard))
        .route("/hosts/me/requests", get(hosts::my_requests))
        .route("/events", post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/status", put(events::update_event_status))
        .route(
            "/conversations",
            get(messaging::list_conversations).post(messaging::create_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(messaging::get_messages).post(messaging::send_message),
        )
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/:id/status", put(payments::update_payment_status))
        .route("/ratings", post(ratings::create_rating))
        .route("/contact", post(contact::submit_contact))
        .route("/uploads/profile-image", post(uploads::upload_profile_image))
        .route("/uploads/document", post(uploads::upload_document))
        .route("/admin/hosts/:id/approval", post(admin::set_host_approval))
        .route(
            "/admin/speakers/:id/approval",
            post(admin::set_speaker_approval),
        )
        .route("/locations/states", get(locations::states))
        .route("/locations/districts", get(locations::districts))
        .route("/locations/mandals", get(locations::mandals))
        .route("/locations/gram-panchayats", get(locations::gram_panchayats))
}

/// Create the HTTP server router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = marketplace_routes()
        .nest("/auth", auth_routes())
        .nest("/fellowship", fellowship_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Document uploads are capped at 10 MB; leave multipart headroom.
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server running on http://{addr}");
    info!("Health check: http://{addr}/health");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
