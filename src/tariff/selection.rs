use chrono::NaiveDate;

use super::schedule::TariffSchedule;

/// The active schedule with the most recent `effective_from`.
///
/// Ties keep the schedule listed first.
pub fn select_active(schedules: &[TariffSchedule]) -> Option<&TariffSchedule> {
    latest(schedules.iter().filter(|s| s.is_active))
}

/// Same as [`select_active`], ignoring schedules not yet in effect on `date`.
pub fn select_active_as_of(schedules: &[TariffSchedule], date: NaiveDate) -> Option<&TariffSchedule> {
    latest(
        schedules
            .iter()
            .filter(|s| s.is_active && s.effective_from <= date),
    )
}

fn latest<'a>(candidates: impl Iterator<Item = &'a TariffSchedule>) -> Option<&'a TariffSchedule> {
    candidates.fold(None, |best: Option<&TariffSchedule>, s| match best {
        Some(b) if b.effective_from >= s.effective_from => Some(b),
        _ => Some(s),
    })
}
