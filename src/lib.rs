pub mod config;
pub mod domain {
    pub mod payment;
    pub mod summary;
}
pub mod gateways;
pub mod health;
pub mod http;
pub mod ledger;
pub mod queue;
pub mod router {
    pub mod settlement_router;
}
pub mod service {
    pub mod retry_orchestrator;
    pub mod settlement_pool;
    pub mod summary_service;
}

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn queue::PaymentQueue>,
    pub summary_service: service::summary_service::SummaryService,
    pub health_table: Arc<health::table::HealthTable>,
}
