//! User notification boundary.

use std::sync::Arc;

use eduplan_billing::PlanId;
use eduplan_core::UserId;

/// Delivers user-facing notices. Implemented by the mailer integration.
pub trait UserNotifier: Send + Sync {
    fn send_blocked_notice(&self, user_id: UserId, plan_id: PlanId) -> anyhow::Result<()>;
}

impl<N> UserNotifier for Arc<N>
where
    N: UserNotifier + ?Sized,
{
    fn send_blocked_notice(&self, user_id: UserId, plan_id: PlanId) -> anyhow::Result<()> {
        (**self).send_blocked_notice(user_id, plan_id)
    }
}

/// Notifier that only records notices in the log (dev environments).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn send_blocked_notice(&self, user_id: UserId, plan_id: PlanId) -> anyhow::Result<()> {
        tracing::info!(%user_id, %plan_id, "blocked notice sent");
        Ok(())
    }
}
