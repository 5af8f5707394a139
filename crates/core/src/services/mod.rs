pub mod aggregation_service;
pub mod gateway_service;
pub mod ledger_service;
pub mod migration_service;
pub mod report_service;
pub mod session_service;
