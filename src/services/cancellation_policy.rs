//! Política de cancelación
//!
//! Una reserva puede cancelarse solo antes de las 00:00 del día de recogida
//! menos 24 horas. Sin zona horaria: los límites de día son los del local
//! de alquiler.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Horas antes del inicio del día de recogida en que se cierra la ventana
pub const CANCELLATION_WINDOW_HOURS: i64 = 24;

/// Último instante (exclusivo) en que se admite la cancelación
pub fn cancellation_deadline(pickup_date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(pickup_date, NaiveTime::MIN) - Duration::hours(CANCELLATION_WINDOW_HOURS)
}

pub fn is_allowed(pickup_date: NaiveDate, now: NaiveDateTime) -> bool {
    now < cancellation_deadline(pickup_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn pickup_within_a_day_is_not_cancellable() {
        let now = dt("2025-05-30T23:00:00");
        let soon = (now + Duration::hours(12)).date();
        let later = (now + Duration::hours(36)).date();

        assert!(!is_allowed(soon, now));
        assert!(is_allowed(later, now));
    }

    #[test]
    fn deadline_is_exclusive() {
        let pickup = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(is_allowed(pickup, dt("2025-05-31T23:59:59")));
        assert!(!is_allowed(pickup, dt("2025-06-01T00:00:00")));
    }

    #[test]
    fn allowed_is_monotonic_in_now() {
        let pickup = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let start = dt("2025-06-05T00:00:00");
        let mut previously_allowed = true;
        for hour in 0..(24 * 8) {
            let now = start + Duration::hours(hour);
            let allowed = is_allowed(pickup, now);
            assert!(previously_allowed || !allowed, "became allowed again at {}", now);
            previously_allowed = allowed;
        }
        assert!(!previously_allowed);
    }
}
