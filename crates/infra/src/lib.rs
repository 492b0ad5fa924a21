//! Infrastructure layer: billing store, plan workflows, notice worker, config.

pub mod config;
pub mod notifier;
pub mod plan_service;
pub mod store;
pub mod workers;

pub use config::{BillingConfig, ConfigError};
pub use notifier::{LogNotifier, UserNotifier};
pub use plan_service::{PlanService, ServiceError, ServiceResult};
pub use store::{BillingStore, BillingTransaction, InMemoryBillingStore, StoreError};
pub use workers::{BlockedNoticeWorker, NoticeError, WorkerHandle};
