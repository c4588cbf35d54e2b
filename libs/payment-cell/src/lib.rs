pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

use std::sync::Arc;

use shared_config::AppConfig;

use services::payments::PaymentService;

/// State handed to the payment routes: the config backing the auth
/// middleware plus the payment service with its constructor-injected
/// stores and gateway.
pub struct PaymentCellState {
    pub config: Arc<AppConfig>,
    pub payments: PaymentService,
}
