//! Motor de precios
//!
//! Cálculo puro del precio de una reserva a partir del rango de fechas, la
//! tarifa diaria y los extras. Todo en `Decimal` para evitar deriva por
//! redondeo binario.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::booking::Extras;

/// 10.00 por día
pub const INSURANCE_PER_DAY: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
/// 5.00 por día
pub const ADDITIONAL_DRIVER_PER_DAY: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
/// 3.00 por día
pub const CHILD_SEAT_PER_DAY: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
/// 13%
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(13, 0, 0, false, 2);

/// Kilómetros incluidos por día de alquiler
pub const MILEAGE_ALLOWANCE_PER_DAY: i64 = 300;
/// 0.25 por km excedido
pub const EXTRA_MILEAGE_PER_KM: Decimal = Decimal::from_parts(25, 0, 0, false, 2);
/// 50.00 por día de retraso
pub const LATE_FEE_PER_DAY: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

const MONEY_SCALE: u32 = 2;

/// Desglose del precio de una reserva
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    pub days: i64,
    pub base: Decimal,
    pub extras_cost: Decimal,
    pub taxes: Decimal,
    pub total: Decimal,
}

impl PriceBreakdown {
    pub fn subtotal(&self) -> Decimal {
        self.base + self.extras_cost
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEngine {
    tax_rate: Decimal,
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

impl PricingEngine {
    pub fn new(tax_rate: Decimal) -> Self {
        Self { tax_rate }
    }

    /// Días facturables, inclusivo en ambos extremos y nunca menos de 1
    pub fn rental_days(pickup_date: NaiveDate, return_date: NaiveDate) -> i64 {
        ((return_date - pickup_date).num_days() + 1).max(1)
    }

    /// Recargo diario de los extras seleccionados
    pub fn extras_per_day(extras: &Extras) -> Decimal {
        let mut per_day = Decimal::ZERO;
        if extras.insurance {
            per_day += INSURANCE_PER_DAY;
        }
        if extras.additional_driver {
            per_day += ADDITIONAL_DRIVER_PER_DAY;
        }
        if extras.child_seat {
            per_day += CHILD_SEAT_PER_DAY;
        }
        per_day
    }

    pub fn price(
        &self,
        pickup_date: NaiveDate,
        return_date: NaiveDate,
        daily_rate: Decimal,
        extras: &Extras,
    ) -> PriceBreakdown {
        let days = Self::rental_days(pickup_date, return_date);
        let day_count = Decimal::from(days);

        let base = day_count * daily_rate;
        let extras_cost = day_count * Self::extras_per_day(extras);
        let taxes = round_money((base + extras_cost) * self.tax_rate);

        PriceBreakdown {
            days,
            base,
            extras_cost,
            taxes,
            total: base + extras_cost + taxes,
        }
    }

    /// Coste por kilómetros por encima de la franquicia diaria
    pub fn extra_mileage_cost(
        days: i64,
        checkout_mileage: Decimal,
        return_mileage: Decimal,
    ) -> Decimal {
        let driven = return_mileage - checkout_mileage;
        let allowance = Decimal::from(MILEAGE_ALLOWANCE_PER_DAY * days.max(1));
        let excess = driven - allowance;
        if excess <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        round_money(excess * EXTRA_MILEAGE_PER_KM)
    }

    /// Recargo por devolución tardía.
    ///
    /// El plazo vence a las 23:59:59 del día de devolución. Cualquier retraso
    /// cuenta como al menos un día; después, días completos.
    pub fn late_fee(return_date: NaiveDate, actual_return: NaiveDateTime) -> Decimal {
        let deadline = return_deadline(return_date);
        if actual_return <= deadline {
            return Decimal::ZERO;
        }
        let days_late = (actual_return - deadline).num_days().max(1);
        LATE_FEE_PER_DAY * Decimal::from(days_late)
    }
}

/// Último segundo del día de devolución
pub fn return_deadline(return_date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(return_date, NaiveTime::MIN) + Duration::days(1) - Duration::seconds(1)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn three_day_rental_without_extras() {
        let price = PricingEngine::default().price(
            d("2025-06-01"),
            d("2025-06-03"),
            Decimal::from(60),
            &Extras::none(),
        );

        assert_eq!(price.days, 3);
        assert_eq!(price.base, Decimal::from(180));
        assert_eq!(price.extras_cost, Decimal::ZERO);
        assert_eq!(price.taxes, Decimal::new(2340, 2));
        assert_eq!(price.total, Decimal::new(20340, 2));
    }

    #[test]
    fn insurance_adds_ten_per_day() {
        let extras = Extras {
            insurance: true,
            ..Extras::none()
        };
        let price =
            PricingEngine::default().price(d("2025-06-01"), d("2025-06-03"), Decimal::from(60), &extras);

        assert_eq!(price.extras_cost, Decimal::from(30));
        assert_eq!(price.subtotal(), Decimal::from(210));
        assert_eq!(price.taxes, Decimal::new(2730, 2));
        assert_eq!(price.total, Decimal::new(23730, 2));
    }

    #[test]
    fn all_extras_sum_to_eighteen_per_day() {
        let extras = Extras {
            insurance: true,
            additional_driver: true,
            child_seat: true,
        };
        assert_eq!(PricingEngine::extras_per_day(&extras), Decimal::from(18));
    }

    #[test]
    fn days_never_drop_below_one() {
        assert_eq!(PricingEngine::rental_days(d("2025-06-01"), d("2025-06-01")), 1);
        assert_eq!(PricingEngine::rental_days(d("2025-06-02"), d("2025-06-01")), 1);
        assert_eq!(PricingEngine::rental_days(d("2025-06-01"), d("2025-06-10")), 10);
    }

    #[test]
    fn total_is_subtotal_plus_rounded_tax() {
        let engine = PricingEngine::default();
        let extras = Extras {
            child_seat: true,
            ..Extras::none()
        };
        for (rate, days) in [(Decimal::new(3999, 2), 4), (Decimal::new(7333, 2), 7), (Decimal::from(1), 1)] {
            let pickup = d("2025-07-01");
            let ret = pickup + Duration::days(days - 1);
            let price = engine.price(pickup, ret, rate, &extras);
            let expected_taxes = (price.subtotal() * Decimal::new(13, 2)).round_dp(2);
            assert!(price.days >= 1);
            assert_eq!(price.total, price.subtotal() + expected_taxes);
            assert!((price.total - price.subtotal() * Decimal::new(113, 2)).abs() <= Decimal::new(5, 3));
        }
    }

    #[test]
    fn configured_tax_rate_is_applied() {
        let price = PricingEngine::new(Decimal::new(19, 2)).price(
            d("2025-06-01"),
            d("2025-06-01"),
            Decimal::from(100),
            &Extras::none(),
        );
        assert_eq!(price.taxes, Decimal::from(19));
        assert_eq!(price.total, Decimal::from(119));
    }

    #[test]
    fn mileage_within_allowance_is_free() {
        let cost = PricingEngine::extra_mileage_cost(3, Decimal::from(50000), Decimal::from(50900));
        assert_eq!(cost, Decimal::ZERO);

        let cost = PricingEngine::extra_mileage_cost(3, Decimal::from(50000), Decimal::from(51000));
        assert_eq!(cost, Decimal::from(25));
    }

    #[test]
    fn late_fee_counts_any_delay_as_one_day() {
        let return_date = d("2025-06-03");
        assert_eq!(PricingEngine::late_fee(return_date, dt("2025-06-03T23:59:59")), Decimal::ZERO);
        assert_eq!(PricingEngine::late_fee(return_date, dt("2025-06-04T08:00:00")), Decimal::from(50));
        assert_eq!(PricingEngine::late_fee(return_date, dt("2025-06-06T00:00:00")), Decimal::from(100));
    }
}
