//! Consumption-limit alerting.
//!
//! [`classify`] decides whether current usage warrants a warning or an
//! exceeded alert. Delivering the alert is a separate concern handled by
//! [`AlertDispatcher`]; a failed delivery never affects classification.

mod classifier;
mod limit;
mod notify;

pub use classifier::{AlertResult, AlertState, classify};
pub use limit::{
    ConsumptionLimit, DEFAULT_ALERT_THRESHOLD_PERCENT, LimitError, MAX_ALERT_THRESHOLD_PERCENT,
    MIN_ALERT_THRESHOLD_PERCENT,
};
pub use notify::{
    AlertDispatcher, AlertNotification, AlertNotifier, DEFAULT_NOTIFY_TIMEOUT_SECS,
    DispatchReport, LogNotifier, NotifyError,
};
