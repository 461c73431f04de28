//! Billing Service Tests
//!
//! End-to-end workflows through `BillingService`: tariffs, readings, bills,
//! limits and alerts, permissions, and stores fed from normalized records.
//!
//! Run: cargo nextest run --test billing_service_tests

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use utility_billing::{AccountContext, BillingPeriod, BillingService, MeterReading};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn admin() -> AccountContext {
    AccountContext::admin("ops")
}

fn period(s: &str) -> BillingPeriod {
    s.parse().unwrap()
}

fn reading(account: &str, p: &str, previous: u32, current: u32) -> MeterReading {
    MeterReading::new(account, period(p), previous.into(), current.into())
}

// =============================================================================
// Tariffs and bills
// =============================================================================

mod bill_tests {
    use super::*;
    use utility_billing::{BillStatus, Error, TariffSchedule};

    #[tokio::test]
    async fn test_month_over_month_billing() {
        init_tracing();
        let service = BillingService::in_memory();
        service
            .publish_tariff(
                &admin(),
                TariffSchedule::builder()
                    .base_fee(dec!(30))
                    .tier1(dec!(50), dec!(4))
                    .tier2(dec!(150), dec!(6))
                    .tier3_rate(dec!(8))
                    .effective_from(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
                    .active(true)
                    .build(),
            )
            .await
            .unwrap();

        let jan = service
            .record_reading(&admin(), reading("cust-1", "2025-01", 1000, 1040))
            .await
            .unwrap();
        let feb = service
            .record_reading(&admin(), reading("cust-1", "2025-02", 1040, 1240))
            .await
            .unwrap();

        // 30 + 40 × 4
        assert_eq!(jan.bill.amount, dec!(190.00));
        // 30 + 50 × 4 + 100 × 6 + 50 × 8
        assert_eq!(feb.bill.amount, dec!(1230.00));
        assert_eq!(feb.bill.fixed_charges, dec!(30));
        assert_eq!(feb.bill.usage_charges(), dec!(1200.00));

        let owner = AccountContext::customer("cust-1");
        let bills = service.bills_for(&owner, "cust-1").await.unwrap();
        assert_eq!(
            bills.iter().map(|b| b.period.to_string()).collect::<Vec<_>>(),
            vec!["2025-02", "2025-01"]
        );
    }

    #[tokio::test]
    async fn test_newer_tariff_takes_over() {
        let service = BillingService::in_memory();
        for (base_fee, year) in [(dec!(40), 2024), (dec!(45), 2025)] {
            let schedule = TariffSchedule::builder()
                .base_fee(base_fee)
                .effective_from(NaiveDate::from_ymd_opt(year, 1, 1).unwrap())
                .active(true)
                .build();
            service.publish_tariff(&admin(), schedule).await.unwrap();
        }

        let outcome = service
            .record_reading(&admin(), reading("cust-1", "2025-05", 0, 0))
            .await
            .unwrap();
        assert_eq!(outcome.bill.amount, dec!(45.00));
        assert_eq!(service.tariffs().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_tariff_rejected() {
        let service = BillingService::in_memory();
        let schedule = TariffSchedule::builder().base_fee(dec!(-5)).build();
        let err = service.publish_tariff(&admin(), schedule).await.unwrap_err();
        assert!(matches!(err, Error::Tariff(_)));
        assert!(err.is_validation_error());
        assert!(service.tariffs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_admin_toggles_status() {
        let service = BillingService::in_memory();
        let bill = service
            .record_reading(&admin(), reading("cust-1", "2025-03", 0, 120))
            .await
            .unwrap()
            .bill;

        let paid = service
            .set_bill_status(&admin(), bill.id, bill.status.toggled())
            .await
            .unwrap();
        assert_eq!(paid.status, BillStatus::Paid);

        let reverted = service
            .set_bill_status(&admin(), bill.id, paid.status.toggled())
            .await
            .unwrap();
        assert_eq!(reverted.status, BillStatus::Pending);

        let err = service
            .set_bill_status(&AccountContext::customer("cust-1"), bill.id, BillStatus::Paid)
            .await
            .unwrap_err();
        assert!(err.is_authorization_error());
    }

    #[tokio::test]
    async fn test_summary_after_payments() {
        let service = BillingService::in_memory();
        let a = service
            .record_reading(&admin(), reading("a", "2025-03", 0, 100))
            .await
            .unwrap();
        service
            .record_reading(&admin(), reading("b", "2025-03", 0, 250))
            .await
            .unwrap();

        service
            .pay_bill(&AccountContext::customer("a"), a.bill.id)
            .await
            .unwrap();

        let summary = service.summary(&admin()).await.unwrap();
        assert_eq!(summary.total_bills, 2);
        assert_eq!(summary.paid, 1);
        assert_eq!(summary.collected, dec!(550.00));
        assert_eq!(summary.outstanding, dec!(1675.00));
        assert_eq!(summary.revenue, dec!(2225.00));
    }

    #[tokio::test]
    async fn test_summary_over_due_date_range() {
        let service = BillingService::in_memory();
        for (p, current) in [("2025-01", 100), ("2025-02", 200), ("2025-03", 450)] {
            service
                .record_reading(&admin(), reading("cust-1", p, 0, current))
                .await
                .unwrap();
        }
        let due = |m| NaiveDate::from_ymd_opt(2025, m, 15);

        let all = service.summary_between(&admin(), None, None).await.unwrap();
        assert_eq!(all, service.summary(&admin()).await.unwrap());
        assert_eq!(all.total_bills, 3);

        // February and March bills fall due in March and April
        let spring = service
            .summary_between(&admin(), due(3), due(4))
            .await
            .unwrap();
        assert_eq!(spring.total_bills, 2);
        assert_eq!(spring.revenue, dec!(1300.00) + dec!(3400.00));

        let err = service
            .summary_between(&AccountContext::customer("cust-1"), None, due(4))
            .await
            .unwrap_err();
        assert!(err.is_authorization_error());
    }
}

// =============================================================================
// Limits and alerts
// =============================================================================

mod alert_tests {
    use super::*;
    use std::sync::Mutex;
    use utility_billing::{
        AlertNotification, AlertNotifier, AlertState, ConsumptionLimit, NotifyError,
    };

    #[derive(Clone, Default)]
    struct Outbox(Arc<Mutex<Vec<AlertNotification>>>);

    #[async_trait::async_trait]
    impl AlertNotifier for Outbox {
        fn name(&self) -> &str {
            "outbox"
        }

        async fn notify(&self, notification: &AlertNotification) -> Result<(), NotifyError> {
            if notification.recipient_email.is_none() {
                return Err(NotifyError::MissingRecipient(notification.account_id.clone()));
            }
            self.0.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_customer_manages_own_limit() {
        let service = BillingService::in_memory();
        let owner = AccountContext::customer("cust-1");

        let limit = service.settings().limit(dec!(400));
        service
            .set_consumption_limit(&owner, "cust-1", limit.clone())
            .await
            .unwrap();
        assert_eq!(
            service.consumption_limit(&owner, "cust-1").await.unwrap(),
            Some(limit)
        );

        let err = service
            .set_consumption_limit(&owner, "cust-2", ConsumptionLimit::new(dec!(1)))
            .await
            .unwrap_err();
        assert!(err.is_authorization_error());

        assert!(service.clear_consumption_limit(&owner, "cust-1").await.unwrap());
        assert!(!service.clear_consumption_limit(&owner, "cust-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_exceeded_alert_reaches_owner() {
        init_tracing();
        let outbox = Outbox::default();
        let service = BillingService::in_memory().notifier(outbox.clone());
        let owner = AccountContext::customer("cust-1")
            .with_email("owner@example.com")
            .with_name("Owner");

        service
            .set_consumption_limit(&owner, "cust-1", ConsumptionLimit::new(dec!(1000)))
            .await
            .unwrap();
        service
            .record_reading(&admin(), reading("cust-1", "2025-06", 5000, 6100))
            .await
            .unwrap();

        let check = service
            .check_consumption(&owner, "cust-1", period("2025-06"))
            .await
            .unwrap();
        let alert = check.alert.unwrap();
        assert_eq!(alert.state, AlertState::Exceeded);
        assert_eq!(alert.percentage_used, 110);
        assert_eq!(alert.exceeded_by(), Some(dec!(100)));

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient_name.as_deref(), Some("Owner"));
        assert_eq!(sent[0].period, period("2025-06"));
    }

    #[tokio::test]
    async fn test_admin_check_reports_missing_recipient() {
        let outbox = Outbox::default();
        let service = BillingService::in_memory().notifier(outbox.clone());
        service
            .set_consumption_limit(&admin(), "cust-1", ConsumptionLimit::new(dec!(100)))
            .await
            .unwrap();
        service
            .record_reading(&admin(), reading("cust-1", "2025-06", 0, 90))
            .await
            .unwrap();

        let check = service
            .check_consumption(&admin(), "cust-1", period("2025-06"))
            .await
            .unwrap();
        assert_eq!(check.alert.unwrap().state, AlertState::Warning);

        let report = check.dispatch.unwrap();
        assert!(!report.all_delivered());
        assert_eq!(report.attempted(), 1);
        assert!(outbox.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_below_threshold_is_quiet() {
        let outbox = Outbox::default();
        let service = BillingService::in_memory().notifier(outbox.clone());
        service
            .set_consumption_limit(&admin(), "cust-1", ConsumptionLimit::new(dec!(1000)))
            .await
            .unwrap();
        service
            .record_reading(&admin(), reading("cust-1", "2025-06", 0, 800))
            .await
            .unwrap();

        let check = service
            .check_consumption(&admin(), "cust-1", period("2025-06"))
            .await
            .unwrap();
        assert_eq!(check.current_usage, dec!(800));
        assert!(check.alert.is_none());
        assert!(check.dispatch.is_none());
    }
}

// =============================================================================
// Stores fed from normalized records
// =============================================================================

mod record_store_tests {
    use super::*;
    use serde_json::json;
    use utility_billing::store::record::{bill_from_record, reading_from_record, tariff_from_record};
    use utility_billing::{BillingSettings, BillingStore, MemoryStore};

    #[tokio::test]
    async fn test_service_over_imported_rows() {
        let store = Arc::new(MemoryStore::new());

        let tariff = tariff_from_record(&json!({
            "effective_from": "2025-01-01",
            "fixed_charge": "35",
            "tier1_units_up_to": 100,
            "tier1_rate": 4,
            "is_active": true
        }))
        .unwrap();
        store.save_tariff(&tariff).await.unwrap();

        let imported = bill_from_record(&json!({
            "id": "3f2b8a8e-4c1d-4f7a-9d2e-5b6c7d8e9f01",
            "user_id": "cust-7",
            "billing_month": "2025-02",
            "amt": 400,
            "status": "unpaid"
        }))
        .unwrap();
        store.upsert_bill(&imported).await.unwrap();

        let row = reading_from_record(&json!({
            "user_id": "cust-7",
            "billing_month": "2025-03",
            "month": "2025-02",
            "current_reading": "1500",
            "units_consumed": 120
        }))
        .unwrap();
        assert_eq!(row.previous_reading, dec!(1380));

        let service = BillingService::new(store.clone(), BillingSettings::default());
        let outcome = service.record_reading(&admin(), row).await.unwrap();

        // 35 + 100 × 4 + 20 × 7.5
        assert_eq!(outcome.bill.amount, dec!(585.00));
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.bill.period, period("2025-03"));

        let bills = service
            .bills_for(&AccountContext::customer("cust-7"), "cust-7")
            .await
            .unwrap();
        assert_eq!(bills.len(), 2);
        assert_eq!(bills[1].id, imported.id);
        assert_eq!(store.bill_count(), 2);
    }
}
