use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::scheduling::SchedulingService;
use appointment_cell::store::{
    AppointmentStore, SupabaseAppointmentStore, SupabaseUserDirectory, UserDirectory,
};
use appointment_cell::AppointmentCellState;
use payment_cell::services::mercado_pago::{MercadoPagoClient, PaymentGateway};
use payment_cell::services::payments::PaymentService;
use payment_cell::store::{PaymentStore, SupabasePaymentStore};
use payment_cell::PaymentCellState;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MedCita API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // Wire the stores and services explicitly; nothing reaches for storage
    // through ambient state.
    let supabase = Arc::new(SupabaseClient::new(&config));
    let appointments: Arc<dyn AppointmentStore> =
        Arc::new(SupabaseAppointmentStore::new(Arc::clone(&supabase)));
    let directory: Arc<dyn UserDirectory> =
        Arc::new(SupabaseUserDirectory::new(Arc::clone(&supabase)));
    let payments: Arc<dyn PaymentStore> =
        Arc::new(SupabasePaymentStore::new(Arc::clone(&supabase)));
    let gateway: Arc<dyn PaymentGateway> = Arc::new(MercadoPagoClient::new(&config));

    let appointment_state = Arc::new(AppointmentCellState {
        config: Arc::clone(&config),
        scheduler: SchedulingService::new(Arc::clone(&appointments), directory),
    });
    let payment_state = Arc::new(PaymentCellState {
        config: Arc::clone(&config),
        payments: PaymentService::new(appointments, payments, gateway),
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(appointment_state, payment_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .await
        .unwrap();
}
