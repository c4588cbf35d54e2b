pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

use std::sync::Arc;

use shared_config::AppConfig;

use services::scheduling::SchedulingService;

/// State handed to the appointment routes: the config backing the auth
/// middleware plus the scheduler with its constructor-injected stores.
pub struct AppointmentCellState {
    pub config: Arc<AppConfig>,
    pub scheduler: SchedulingService,
}
