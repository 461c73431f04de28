//! Billing Core Tests
//!
//! Tests for the pure core: tiered pricing, tariff selection, alert
//! classification, billing periods, record normalization and settings.
//!
//! Run: cargo nextest run --test billing_core_tests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use utility_billing::TariffSchedule;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn schedule(base_fee: Decimal, effective_from: NaiveDate, is_active: bool) -> TariffSchedule {
    TariffSchedule::builder()
        .base_fee(base_fee)
        .effective_from(effective_from)
        .active(is_active)
        .build()
}

// =============================================================================
// Tiered pricing
// =============================================================================

mod pricing_tests {
    use super::*;
    use utility_billing::{Tier, compute_bill, compute_breakdown};

    #[test]
    fn test_tier_boundaries() {
        let s = TariffSchedule::fallback();
        assert_eq!(compute_bill(dec!(0), &s), dec!(50.00));
        assert_eq!(compute_bill(dec!(100), &s), dec!(550.00));
        assert_eq!(compute_bill(dec!(250), &s), dec!(1675.00));
        assert_eq!(compute_bill(dec!(300), &s), dec!(2050.00));
        assert_eq!(compute_bill(dec!(350), &s), dec!(2500.00));
        assert_eq!(compute_bill(dec!(100), &s).to_string(), "550.00");
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let breakdown = compute_breakdown(dec!(412.5), &TariffSchedule::fallback());
        assert_eq!(breakdown.billed_units(), dec!(412.5));
        assert_eq!(breakdown.tier(Tier::Tier1).unwrap().units, dec!(100));
        assert_eq!(breakdown.tier(Tier::Tier2).unwrap().units, dec!(200));
        assert_eq!(breakdown.tier(Tier::Tier3).unwrap().units, dec!(112.5));
        assert_eq!(
            breakdown.base_fee + breakdown.usage_charges(),
            breakdown.total
        );
    }

    #[test]
    fn test_monotonic_in_units() {
        let s = TariffSchedule::fallback();
        let mut previous = compute_bill(Decimal::ZERO, &s);
        for units in (1..=500).map(|u| Decimal::from(u) * dec!(0.75)) {
            let next = compute_bill(units, &s);
            assert!(next >= previous, "bill decreased at {units}");
            previous = next;
        }
    }

    #[test]
    fn test_total_is_at_least_base_fee() {
        let s = schedule(dec!(12.34), date(2025, 1, 1), true);
        for units in [dec!(-10), dec!(0), dec!(0.01), dec!(1000)] {
            assert!(compute_bill(units, &s) >= dec!(12.34));
        }
    }

    #[test]
    fn test_misordered_bounds_still_price() {
        let s = TariffSchedule::builder()
            .tier1(dec!(300), dec!(5))
            .tier2(dec!(100), dec!(7.5))
            .build();
        assert!(s.validate().is_err());
        // tier 2 collapses to zero width
        assert_eq!(compute_bill(dec!(350), &s), dec!(50) + dec!(1500) + dec!(450));
    }
}

// =============================================================================
// Tariff selection
// =============================================================================

mod selection_tests {
    use super::*;
    use utility_billing::{TariffCalculator, select_active};

    #[test]
    fn test_latest_active_wins() {
        let schedules = vec![
            schedule(dec!(40), date(2024, 1, 1), true),
            schedule(dec!(60), date(2025, 6, 1), true),
            schedule(dec!(99), date(2026, 1, 1), false),
        ];
        let selected = select_active(&schedules).unwrap();
        assert_eq!(selected.base_fee, dec!(60));
    }

    #[test]
    fn test_no_active_schedule_uses_fallback() {
        let calculator = TariffCalculator::default();
        let schedules = vec![schedule(dec!(99), date(2025, 1, 1), false)];
        let priced = calculator.price(dec!(100), &schedules);
        assert!(priced.used_fallback);
        assert_eq!(priced.amount(), dec!(550.00));
    }

    #[test]
    fn test_price_as_of_ignores_future_schedules() {
        let calculator = TariffCalculator::default();
        let schedules = vec![
            schedule(dec!(40), date(2025, 1, 1), true),
            schedule(dec!(80), date(2025, 9, 1), true),
        ];
        let priced = calculator.price_as_of(dec!(0), &schedules, date(2025, 3, 31));
        assert_eq!(priced.amount(), dec!(40.00));
        assert!(!priced.used_fallback);
    }
}

// =============================================================================
// Alert classification
// =============================================================================

mod alert_tests {
    use super::*;
    use utility_billing::{AlertState, ConsumptionLimit, classify};

    #[test]
    fn test_states_around_threshold() {
        let limit = ConsumptionLimit::new(dec!(200));
        let state = |usage| classify(usage, Some(&limit)).map(|r| r.state);

        assert_eq!(state(dec!(160)), None);
        assert_eq!(state(dec!(160.01)), Some(AlertState::Warning));
        assert_eq!(state(dec!(200)), Some(AlertState::Warning));
        assert_eq!(state(dec!(200.01)), Some(AlertState::Exceeded));
    }

    #[test]
    fn test_documented_examples() {
        let limit = ConsumptionLimit::new(dec!(1000));

        let warning = classify(dec!(850), Some(&limit)).unwrap();
        assert_eq!(warning.state, AlertState::Warning);
        assert_eq!(warning.percentage_used, 85);

        assert!(classify(dec!(800), Some(&limit)).is_none());

        let exceeded = classify(dec!(1100), Some(&limit)).unwrap();
        assert_eq!(exceeded.state, AlertState::Exceeded);
        assert_eq!(exceeded.percentage_used, 110);
    }

    #[test]
    fn test_no_limit_means_no_result() {
        assert!(classify(dec!(500), None).is_none());
        assert!(classify(dec!(500), Some(&ConsumptionLimit::unlimited())).is_none());
        assert!(classify(dec!(500), Some(&ConsumptionLimit::new(Decimal::ZERO))).is_none());
    }

    #[test]
    fn test_exceeded_by_values() {
        let limit = ConsumptionLimit::new(dec!(200));
        let result = classify(dec!(250), Some(&limit)).unwrap();
        assert!(result.is_exceeded());
        assert_eq!(result.percentage_used, 125);
        assert_eq!(result.exceeded_by(), Some(dec!(50)));
        assert_eq!(result.exceeded_by_percent(), Some(25));

        let warning = classify(dec!(190), Some(&limit)).unwrap();
        assert_eq!(warning.exceeded_by(), None);
    }

    #[test]
    fn test_should_email_respects_flag() {
        let enabled = ConsumptionLimit::new(dec!(100));
        let disabled = enabled.clone().with_email_alerts(false);
        let result = classify(dec!(95), Some(&enabled)).unwrap();
        assert!(result.should_email(&enabled));
        assert!(!result.should_email(&disabled));

        assert!(classify(dec!(10), Some(&enabled)).is_none());
    }
}

// =============================================================================
// Billing periods and bills
// =============================================================================

mod billing_tests {
    use super::*;
    use utility_billing::{Bill, BillStatus, BillingPeriod, BillingSummary, compute_breakdown};

    #[test]
    fn test_period_parsing_and_due_date() {
        let period: BillingPeriod = "2025-12".parse().unwrap();
        assert_eq!(period.to_string(), "2025-12");
        assert_eq!(period.next().to_string(), "2026-01");
        assert_eq!(period.due_date(), Some(date(2026, 1, 15)));

        assert!("2025-13".parse::<BillingPeriod>().is_err());
        assert!("25-01".parse::<BillingPeriod>().is_err());
    }

    #[test]
    fn test_bill_overdue_and_summary() {
        let period: BillingPeriod = "2025-02".parse().unwrap();
        let breakdown = compute_breakdown(dec!(100), &TariffSchedule::fallback());
        let pending = Bill::generate("a", period, &breakdown).unwrap();
        let mut paid = Bill::generate("b", period, &breakdown).unwrap();
        paid.status = BillStatus::Paid;

        assert!(pending.is_overdue(date(2025, 3, 16)));
        assert!(!pending.is_overdue(date(2025, 3, 15)));
        assert!(!paid.is_overdue(date(2025, 12, 1)));

        let summary = BillingSummary::from_bills([&pending, &paid]);
        assert_eq!(summary.revenue, dec!(1100.00));
        assert_eq!(summary.collected, dec!(550.00));
        assert_eq!(summary.outstanding, dec!(550.00));
    }
}

// =============================================================================
// Record normalization
// =============================================================================

mod record_tests {
    use super::*;
    use serde_json::json;
    use utility_billing::BillStatus;
    use utility_billing::store::record::{bill_from_record, limit_from_record, tariff_from_record};

    #[test]
    fn test_bill_aliases_and_string_numbers() {
        let bill = bill_from_record(&json!({
            "id": "7b0f5c1e-2a7d-4b8e-9f5e-0a1b2c3d4e5f",
            "user_id": "cust-9",
            "month": "2025-04-01",
            "total_amount": "1675.00",
            "units_consumed": 250,
            "payment_status": "Paid"
        }))
        .unwrap();

        assert_eq!(bill.account_id, "cust-9");
        assert_eq!(bill.period.to_string(), "2025-04");
        assert_eq!(bill.amount, dec!(1675.00));
        assert_eq!(bill.units, dec!(250));
        assert_eq!(bill.status, BillStatus::Paid);
        assert_eq!(bill.due_date, date(2025, 5, 15));
    }

    #[test]
    fn test_malformed_bill_rejected() {
        assert!(bill_from_record(&json!(["not", "an", "object"])).is_err());
        assert!(bill_from_record(&json!({ "id": "not-a-uuid", "account_id": "a", "period": "2025-01" })).is_err());
    }

    #[test]
    fn test_tariff_defaults_and_activity() {
        let tariff = tariff_from_record(&json!({
            "effective_from": "2025-07-01",
            "base_fee": 45,
            "is_active": true
        }))
        .unwrap();
        assert_eq!(tariff.base_fee, dec!(45));
        assert_eq!(tariff.tier2_rate, dec!(7.5));
        assert!(tariff.is_active);

        let inactive = tariff_from_record(&json!({ "effective_from": "2025-07-01" })).unwrap();
        assert!(!inactive.is_active);
    }

    #[test]
    fn test_limit_null_stays_absent() {
        let limit = limit_from_record(&json!({
            "monthly_limit": null,
            "alert_threshold": "90",
            "email_alert": false
        }))
        .unwrap();
        assert_eq!(limit.monthly_limit, None);
        assert_eq!(limit.alert_threshold_percent, 90);
        assert!(!limit.email_alert_enabled);

        assert!(limit_from_record(&json!({ "alert_threshold_percent": 85.5 })).is_err());
    }
}

// =============================================================================
// Settings
// =============================================================================

mod settings_tests {
    use super::*;
    use tempfile::TempDir;
    use utility_billing::{BillingSettings, ConfigBuilder, MemoryConfigProvider};

    #[tokio::test]
    async fn test_layered_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("billing.json");
        tokio::fs::write(
            &path,
            r#"{"tariff": {"base_fee": 60, "tier3_rate": "10.5"}, "alerts": {"notify_timeout_secs": 4}}"#,
        )
        .await
        .unwrap();

        let provider = ConfigBuilder::new()
            .memory(MemoryConfigProvider::new().value("tariff.base_fee", "70"))
            .file(&path)
            .build();
        let settings = BillingSettings::load(&provider).await.unwrap();

        assert_eq!(settings.fallback_tariff.base_fee, dec!(70));
        assert_eq!(settings.fallback_tariff.tier3_rate, dec!(10.5));
        assert_eq!(settings.fallback_tariff.tier1_rate, dec!(5));
        assert_eq!(settings.notify_timeout_secs, 4);
        assert_eq!(settings.default_threshold_percent, 80);
    }

    #[tokio::test]
    async fn test_invalid_file_value_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("billing.json");
        tokio::fs::write(&path, r#"{"tariff": {"tier2_rate": "cheap"}}"#)
            .await
            .unwrap();

        let provider = ConfigBuilder::new().file(&path).build();
        let err = BillingSettings::load(&provider).await.unwrap_err();
        assert!(err.to_string().contains("tariff.tier2_rate"));
    }
}
