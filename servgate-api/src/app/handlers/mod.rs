mod health;
mod services;

pub use health::{handler_404, health};
pub use services::{restart_service, service_status, start_service, stop_service};
