//! Ciclo de vida de una reserva
//!
//! Máquina de estados pura: cada operación recibe una `Booking` y los hechos
//! externos necesarios (hora actual, vehículo) y devuelve una `Transition`
//! con la reserva nueva, o un `BookingError` tipado. Nada aquí hace I/O.
//!
//! El estado persistido (`BookingStatus`) más los hechos de entrega se
//! pliegan en `BookingPhase`, y las transiciones legales viven en una única
//! tabla (`transition`).

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::audit::AuditAction;
use crate::models::booking::{Booking, BookingStatus, Extras};
use crate::models::vehicle::Vehicle;
use crate::services::cancellation_policy;
use crate::services::inventory_sync::VehicleUpdate;
use crate::services::pricing_service::PricingEngine;
use crate::utils::errors::BookingError;

/// Longitud máxima de las notas libres de entrega y daños
pub const MAX_NOTES_LENGTH: usize = 2000;

/// Decimales que admite el kilometraje almacenado (`NUMERIC(12, 1)`)
pub const MILEAGE_SCALE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPhase {
    Requested,
    Confirmed,
    /// CONFIRMED con la entrega registrada
    CheckedOut,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Confirm,
    Cancel,
    CheckOut,
    CheckIn,
}

impl BookingPhase {
    pub fn of(booking: &Booking) -> Self {
        match booking.status {
            BookingStatus::Requested => BookingPhase::Requested,
            BookingStatus::Cancelled => BookingPhase::Cancelled,
            BookingStatus::Completed => BookingPhase::Completed,
            BookingStatus::Confirmed if booking.is_returned() => BookingPhase::Completed,
            BookingStatus::Confirmed if booking.is_checked_out() => BookingPhase::CheckedOut,
            BookingStatus::Confirmed => BookingPhase::Confirmed,
        }
    }

    /// Estado persistido que corresponde a la fase
    pub fn status(&self) -> BookingStatus {
        match self {
            BookingPhase::Requested => BookingStatus::Requested,
            BookingPhase::Confirmed | BookingPhase::CheckedOut => BookingStatus::Confirmed,
            BookingPhase::Completed => BookingStatus::Completed,
            BookingPhase::Cancelled => BookingStatus::Cancelled,
        }
    }
}

/// Tabla de transiciones `(fase, evento) → fase | error`.
///
/// La política de cancelación no se evalúa aquí; `cancel` la aplica después
/// de que la tabla admita el evento.
pub fn transition(phase: BookingPhase, event: LifecycleEvent) -> Result<BookingPhase, BookingError> {
    use BookingPhase::*;
    use LifecycleEvent::*;

    match (phase, event) {
        (Requested, Confirm) => Ok(Confirmed),
        (_, Confirm) => Err(BookingError::invalid_state(format!(
            "Only requested bookings can be confirmed (current state: {})",
            phase.label()
        ))),

        (Requested | Confirmed, Cancel) => Ok(Cancelled),
        (CheckedOut, Cancel) => Err(BookingError::invalid_state(
            "Booking has already been checked out and can no longer be cancelled",
        )),
        (Completed | Cancelled, Cancel) => Err(BookingError::invalid_state(format!(
            "Booking is already {} and cannot be cancelled",
            phase.label()
        ))),

        (Confirmed, CheckOut) => Ok(CheckedOut),
        (CheckedOut | Completed, CheckOut) => Err(BookingError::conflict(
            "Booking has already been checked out",
        )),
        (Requested, CheckOut) => Err(BookingError::invalid_state(
            "Check-out only allowed for confirmed bookings",
        )),
        (Cancelled, CheckOut) => Err(BookingError::invalid_state(
            "Cancelled bookings cannot be checked out",
        )),

        (CheckedOut, CheckIn) => Ok(Completed),
        (Completed, CheckIn) => Err(BookingError::conflict(
            "Booking has already been checked in",
        )),
        (Requested | Confirmed, CheckIn) => Err(BookingError::invalid_state(
            "Booking must first be checked out",
        )),
        (Cancelled, CheckIn) => Err(BookingError::invalid_state(
            "Cancelled bookings cannot be checked in",
        )),
    }
}

impl BookingPhase {
    fn label(&self) -> &'static str {
        match self {
            BookingPhase::Requested => "requested",
            BookingPhase::Confirmed => "confirmed",
            BookingPhase::CheckedOut => "checked out",
            BookingPhase::Completed => "completed",
            BookingPhase::Cancelled => "cancelled",
        }
    }
}

/// Datos de una solicitud de reserva
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub pickup_location: String,
    pub return_location: String,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCommand {
    pub mileage: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageReport {
    pub present: bool,
    pub notes: Option<String>,
    pub cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckinCommand {
    pub mileage: Decimal,
    pub damage: DamageReport,
    /// Por defecto, la hora actual
    pub return_time: Option<NaiveDateTime>,
}

/// Resultado de una transición aceptada
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub booking: Booking,
    pub vehicle_update: Option<VehicleUpdate>,
    pub action: AuditAction,
    pub details: String,
}

/// Solicitud de reserva en estado REQUESTED con el precio fijado en este instante
pub fn create(
    request: NewBooking,
    vehicle: &Vehicle,
    pricing: &PricingEngine,
    now: NaiveDateTime,
) -> Result<Transition, BookingError> {
    let today = now.date();
    if request.pickup_date < today {
        return Err(BookingError::validation("Pickup date must not be in the past"));
    }
    if request.return_date <= request.pickup_date {
        return Err(BookingError::validation("Return date must be after pickup date"));
    }
    let pickup_location = required_text("Pickup location", &request.pickup_location)?;
    let return_location = required_text("Return location", &request.return_location)?;
    if vehicle.id != request.vehicle_id {
        return Err(BookingError::vehicle_not_found(request.vehicle_id));
    }

    let price = pricing.price(
        request.pickup_date,
        request.return_date,
        vehicle.daily_price,
        &request.extras,
    );

    let booking = Booking {
        id: 0,
        customer_id: request.customer_id,
        vehicle_id: vehicle.id,
        vehicle: vehicle.snapshot(),
        pickup_date: request.pickup_date,
        return_date: request.return_date,
        pickup_location,
        return_location,
        extras: request.extras,
        extras_cost: price.extras_cost,
        total_price: price.total,
        status: BookingStatus::Requested,
        cancellation_date: None,
        checkout_time: None,
        checkout_mileage: None,
        checkout_notes: None,
        return_time: None,
        return_mileage: None,
        damage_present: false,
        damage_notes: None,
        damage_cost: None,
        extra_mileage_cost: None,
        late_fee: None,
        version: 1,
        created_at: Some(now),
        updated_at: Some(now),
    };

    Ok(Transition {
        details: format!(
            "Booking requested for {} from {} to {} ({} days, total {})",
            vehicle.label(),
            booking.pickup_date,
            booking.return_date,
            price.days,
            price.total
        ),
        booking,
        vehicle_update: None,
        action: AuditAction::BookingCreated,
    })
}

pub fn confirm(booking: &Booking, now: NaiveDateTime) -> Result<Transition, BookingError> {
    let next = transition(BookingPhase::of(booking), LifecycleEvent::Confirm)?;

    let mut confirmed = booking.clone();
    confirmed.status = next.status();
    confirmed.updated_at = Some(now);

    Ok(Transition {
        booking: confirmed,
        vehicle_update: None,
        action: AuditAction::BookingConfirmed,
        details: "Booking confirmed".to_string(),
    })
}

/// Cancela la reserva; el estado terminal se comprueba antes que la política
pub fn cancel(booking: &Booking, now: NaiveDateTime) -> Result<Transition, BookingError> {
    let next = transition(BookingPhase::of(booking), LifecycleEvent::Cancel)?;

    if !cancellation_policy::is_allowed(booking.pickup_date, now) {
        return Err(BookingError::PolicyViolation(format!(
            "Cancellation is only possible until {} (24 hours before the pickup day)",
            cancellation_policy::cancellation_deadline(booking.pickup_date)
        )));
    }

    let mut cancelled = booking.clone();
    cancelled.status = next.status();
    cancelled.cancellation_date = Some(now);
    cancelled.updated_at = Some(now);

    Ok(Transition {
        booking: cancelled,
        vehicle_update: None,
        action: AuditAction::BookingCancelled,
        details: format!("Booking cancelled at {}", now),
    })
}

/// Entrega del vehículo. No cambia el estado persistido.
pub fn check_out(
    booking: &Booking,
    vehicle: &Vehicle,
    command: CheckoutCommand,
    now: NaiveDateTime,
) -> Result<Transition, BookingError> {
    transition(BookingPhase::of(booking), LifecycleEvent::CheckOut)?;

    validate_mileage("Checkout mileage", command.mileage)?;
    if command.mileage < vehicle.mileage {
        return Err(BookingError::mileage_below_minimum(
            "Checkout mileage",
            vehicle.mileage,
        ));
    }
    if !vehicle.is_available() {
        return Err(BookingError::invalid_state(format!(
            "Vehicle {} is not available for handover (status: {})",
            vehicle.label(),
            vehicle.status
        )));
    }
    let notes = optional_notes("Checkout notes", command.notes)?;

    let mut handed_over = booking.clone();
    handed_over.checkout_time = Some(now);
    handed_over.checkout_mileage = Some(command.mileage);
    handed_over.checkout_notes = notes;
    handed_over.vehicle.mileage = Some(command.mileage);
    handed_over.updated_at = Some(now);

    Ok(Transition {
        booking: handed_over,
        vehicle_update: Some(VehicleUpdate::handover(vehicle.id, command.mileage)),
        action: AuditAction::Pickup,
        details: format!(
            "Vehicle {} handed over at {} km",
            vehicle.label(),
            command.mileage.normalize()
        ),
    })
}

/// Devolución del vehículo: registra los hechos, calcula los cargos
/// posteriores y completa la reserva.
pub fn check_in(
    booking: &Booking,
    command: CheckinCommand,
    now: NaiveDateTime,
) -> Result<Transition, BookingError> {
    validate_mileage("Return mileage", command.mileage)?;
    let next = transition(BookingPhase::of(booking), LifecycleEvent::CheckIn)?;

    let minimum = booking
        .last_known_mileage()
        .ok_or_else(|| BookingError::validation("Mileage snapshot missing for this booking"))?;
    if command.mileage < minimum {
        return Err(BookingError::mileage_below_minimum("Return mileage", minimum));
    }

    let damage = command.damage;
    if damage.cost.is_some_and(|cost| cost < Decimal::ZERO) {
        return Err(BookingError::validation("Damage cost cannot be negative"));
    }
    let damage_notes = optional_notes("Damage notes", damage.notes)?;

    let return_time = command.return_time.unwrap_or(now);
    if booking.checkout_time.is_some_and(|checkout| return_time < checkout) {
        return Err(BookingError::validation(
            "Return time cannot be before checkout time",
        ));
    }

    let days = PricingEngine::rental_days(booking.pickup_date, booking.return_date);
    let extra_mileage_cost = PricingEngine::extra_mileage_cost(days, minimum, command.mileage);
    let late_fee = PricingEngine::late_fee(booking.return_date, return_time);
    let damage_cost = if damage.present {
        damage.cost.unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let mut returned = booking.clone();
    returned.status = next.status();
    returned.return_time = Some(return_time);
    returned.return_mileage = Some(command.mileage);
    returned.damage_present = damage.present;
    returned.damage_notes = damage_notes;
    returned.damage_cost = Some(damage_cost);
    returned.extra_mileage_cost = Some(extra_mileage_cost);
    returned.late_fee = Some(late_fee);
    returned.vehicle.mileage = Some(command.mileage);
    returned.updated_at = Some(now);

    let details = format!(
        "Vehicle returned at {} km (damage: {}, extra mileage: {}, late fee: {})",
        command.mileage.normalize(),
        if damage.present { "yes" } else { "no" },
        extra_mileage_cost,
        late_fee
    );

    Ok(Transition {
        vehicle_update: Some(VehicleUpdate::release(booking.vehicle_id, command.mileage)),
        booking: returned,
        action: AuditAction::Return,
        details,
    })
}

/// Un kilometraje es positivo y cabe en la columna sin redondeo: nunca se
/// redondea antes de compararlo con el mínimo.
pub fn validate_mileage(field: &str, mileage: Decimal) -> Result<Decimal, BookingError> {
    if mileage <= Decimal::ZERO {
        return Err(BookingError::validation(format!(
            "{} must be greater than 0",
            field
        )));
    }
    if mileage.normalize().scale() > MILEAGE_SCALE {
        return Err(BookingError::validation(format!(
            "{} must have at most one decimal place",
            field
        )));
    }
    Ok(mileage)
}

fn required_text(field: &str, value: &str) -> Result<String, BookingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookingError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Notas vacías se guardan como ausentes
fn optional_notes(field: &str, notes: Option<String>) -> Result<Option<String>, BookingError> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let trimmed = notes.trim();
    if trimmed.chars().count() > MAX_NOTES_LENGTH {
        return Err(BookingError::validation(format!(
            "{} must not exceed {} characters",
            field, MAX_NOTES_LENGTH
        )));
    }
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::{PlateValue, VehicleStatus};
    use chrono::Duration;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn vehicle() -> Vehicle {
        Vehicle {
            id: 9,
            license_plate: PlateValue::from("M-BW-320"),
            brand: "BMW".into(),
            model: "320d".into(),
            mileage: Decimal::from(50000),
            daily_price: Decimal::from(60),
            location: "München".into(),
            status: VehicleStatus::Available,
        }
    }

    fn request(pickup: &str, ret: &str) -> NewBooking {
        NewBooking {
            customer_id: 4,
            vehicle_id: 9,
            pickup_date: d(pickup),
            return_date: d(ret),
            pickup_location: "München".into(),
            return_location: "München".into(),
            extras: Extras::none(),
        }
    }

    fn requested() -> Booking {
        let now = dt("2025-05-20T10:00:00");
        let mut booking = create(request("2025-06-01", "2025-06-03"), &vehicle(), &PricingEngine::default(), now)
            .unwrap()
            .booking;
        booking.id = 11;
        booking
    }

    fn confirmed() -> Booking {
        confirm(&requested(), dt("2025-05-21T09:00:00")).unwrap().booking
    }

    fn checked_out() -> Booking {
        let command = CheckoutCommand {
            mileage: Decimal::from(50000),
            notes: Some("Scratch on rear bumper".into()),
        };
        check_out(&confirmed(), &vehicle(), command, dt("2025-06-01T09:00:00"))
            .unwrap()
            .booking
    }

    fn checkin(mileage: i64) -> CheckinCommand {
        CheckinCommand {
            mileage: Decimal::from(mileage),
            damage: DamageReport::default(),
            return_time: Some(dt("2025-06-03T17:00:00")),
        }
    }

    #[test]
    fn create_prices_the_booking_and_starts_requested() {
        let booking = requested();
        assert_eq!(booking.status, BookingStatus::Requested);
        assert_eq!(booking.total_price, Decimal::new(20340, 2));
        assert_eq!(booking.extras_cost, Decimal::ZERO);
        assert_eq!(booking.vehicle.license_plate.normalized(), "M-BW-320");
    }

    #[test]
    fn create_rejects_same_day_and_past_ranges() {
        let now = dt("2025-05-20T10:00:00");
        let pricing = PricingEngine::default();

        let same_day = create(request("2025-06-01", "2025-06-01"), &vehicle(), &pricing, now);
        assert!(matches!(same_day, Err(BookingError::Validation(_))));

        let past = create(request("2025-05-19", "2025-05-22"), &vehicle(), &pricing, now);
        assert!(matches!(past, Err(BookingError::Validation(_))));

        let today = create(request("2025-05-20", "2025-05-22"), &vehicle(), &pricing, now);
        assert!(today.is_ok());
    }

    #[test]
    fn create_requires_locations() {
        let mut req = request("2025-06-01", "2025-06-03");
        req.return_location = "   ".into();
        let result = create(req, &vehicle(), &PricingEngine::default(), dt("2025-05-20T10:00:00"));
        assert_eq!(
            result.unwrap_err(),
            BookingError::validation("Return location is required")
        );
    }

    #[test]
    fn transition_table_is_exhaustive() {
        use BookingPhase::*;
        use LifecycleEvent::*;

        let expected_ok = [
            (Requested, Confirm, Confirmed),
            (Requested, Cancel, Cancelled),
            (Confirmed, Cancel, Cancelled),
            (Confirmed, CheckOut, CheckedOut),
            (CheckedOut, CheckIn, Completed),
        ];
        let phases = [Requested, Confirmed, CheckedOut, Completed, Cancelled];
        let events = [Confirm, Cancel, CheckOut, CheckIn];

        for phase in phases {
            for event in events {
                let result = transition(phase, event);
                match expected_ok.iter().find(|(p, e, _)| *p == phase && *e == event) {
                    Some((_, _, next)) => assert_eq!(result, Ok(*next)),
                    None => assert!(result.is_err(), "{:?} + {:?} should fail", phase, event),
                }
            }
        }
    }

    #[test]
    fn terminal_phases_never_leave() {
        for phase in [BookingPhase::Completed, BookingPhase::Cancelled] {
            for event in [
                LifecycleEvent::Confirm,
                LifecycleEvent::Cancel,
                LifecycleEvent::CheckOut,
                LifecycleEvent::CheckIn,
            ] {
                assert!(transition(phase, event).is_err());
            }
        }
    }

    #[test]
    fn confirm_only_from_requested() {
        let booking = confirmed();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(matches!(
            confirm(&booking, dt("2025-05-22T09:00:00")),
            Err(BookingError::InvalidState(_))
        ));
    }

    #[test]
    fn cancel_respects_the_24_hour_window() {
        let now = dt("2025-05-30T23:00:00");
        let mut booking = confirmed();

        booking.pickup_date = (now + Duration::hours(12)).date();
        assert!(matches!(
            cancel(&booking, now),
            Err(BookingError::PolicyViolation(_))
        ));

        booking.pickup_date = (now + Duration::hours(36)).date();
        let cancelled = cancel(&booking, now).unwrap().booking;
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_date, Some(now));
    }

    #[test]
    fn cancel_of_terminal_booking_is_invalid_state_even_inside_window() {
        let mut booking = requested();
        booking.status = BookingStatus::Cancelled;
        let now = dt("2025-05-31T12:00:00");
        assert!(matches!(cancel(&booking, now), Err(BookingError::InvalidState(_))));
    }

    #[test]
    fn check_out_records_handover_without_changing_status() {
        let transition = check_out(
            &confirmed(),
            &vehicle(),
            CheckoutCommand {
                mileage: Decimal::from(50000),
                notes: Some("  ".into()),
            },
            dt("2025-06-01T09:00:00"),
        )
        .unwrap();

        let booking = transition.booking;
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.checkout_time, Some(dt("2025-06-01T09:00:00")));
        assert_eq!(booking.checkout_mileage, Some(Decimal::from(50000)));
        assert_eq!(booking.checkout_notes, None);
        assert_eq!(BookingPhase::of(&booking), BookingPhase::CheckedOut);
        assert_eq!(
            transition.vehicle_update,
            Some(VehicleUpdate::handover(9, Decimal::from(50000)))
        );
        assert_eq!(transition.action, AuditAction::Pickup);
    }

    #[test]
    fn second_check_out_is_a_conflict() {
        let result = check_out(
            &checked_out(),
            &vehicle(),
            CheckoutCommand {
                mileage: Decimal::from(50000),
                notes: None,
            },
            dt("2025-06-01T09:05:00"),
        );
        assert_eq!(
            result.unwrap_err(),
            BookingError::conflict("Booking has already been checked out")
        );
    }

    #[test]
    fn check_out_below_vehicle_mileage_names_minimum() {
        let result = check_out(
            &confirmed(),
            &vehicle(),
            CheckoutCommand {
                mileage: Decimal::from(49999),
                notes: None,
            },
            dt("2025-06-01T09:00:00"),
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "Checkout mileage must be at least 50000"
        );
    }

    #[test]
    fn check_out_requires_available_vehicle() {
        let mut v = vehicle();
        v.status = VehicleStatus::Maintenance;
        let result = check_out(
            &confirmed(),
            &v,
            CheckoutCommand {
                mileage: Decimal::from(50000),
                notes: None,
            },
            dt("2025-06-01T09:00:00"),
        );
        assert!(matches!(result, Err(BookingError::InvalidState(_))));
    }

    #[test]
    fn check_in_below_checkout_mileage_names_minimum() {
        let err = check_in(&checked_out(), checkin(49000), dt("2025-06-03T17:00:00")).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(err.to_string(), "Return mileage must be at least 50000");

        let err = check_in(&checked_out(), checkin(49999), dt("2025-06-03T17:00:00")).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn check_in_at_checkout_mileage_completes_the_booking() {
        let transition = check_in(&checked_out(), checkin(50000), dt("2025-06-03T17:00:00")).unwrap();
        let booking = transition.booking;

        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(booking.return_mileage, Some(Decimal::from(50000)));
        assert_eq!(booking.extra_mileage_cost, Some(Decimal::ZERO));
        assert_eq!(booking.late_fee, Some(Decimal::ZERO));
        assert_eq!(booking.damage_cost, Some(Decimal::ZERO));
        assert_eq!(booking.total_price, Decimal::new(20340, 2));
        assert_eq!(
            transition.vehicle_update,
            Some(VehicleUpdate::release(9, Decimal::from(50000)))
        );
    }

    #[test]
    fn check_in_computes_post_return_charges() {
        let command = CheckinCommand {
            mileage: Decimal::from(51000),
            damage: DamageReport {
                present: true,
                notes: Some("Dent on driver door".into()),
                cost: Some(Decimal::new(35000, 2)),
            },
            return_time: Some(dt("2025-06-04T10:00:00")),
        };
        let booking = check_in(&checked_out(), command, dt("2025-06-04T10:00:00"))
            .unwrap()
            .booking;

        assert_eq!(booking.extra_mileage_cost, Some(Decimal::from(25)));
        assert_eq!(booking.late_fee, Some(Decimal::from(50)));
        assert_eq!(booking.damage_cost, Some(Decimal::from(350)));
        assert_eq!(booking.post_return_charges(), Decimal::from(425));
    }

    #[test]
    fn damage_cost_is_dropped_without_damage() {
        let mut command = checkin(50100);
        command.damage = DamageReport {
            present: false,
            notes: None,
            cost: Some(Decimal::from(99)),
        };
        let booking = check_in(&checked_out(), command, dt("2025-06-03T17:00:00"))
            .unwrap()
            .booking;
        assert_eq!(booking.damage_cost, Some(Decimal::ZERO));
    }

    #[test]
    fn check_in_before_check_out_is_invalid_state() {
        let err = check_in(&confirmed(), checkin(50100), dt("2025-06-03T17:00:00")).unwrap_err();
        assert_eq!(err, BookingError::invalid_state("Booking must first be checked out"));
    }

    #[test]
    fn second_check_in_is_a_conflict() {
        let done = check_in(&checked_out(), checkin(50100), dt("2025-06-03T17:00:00"))
            .unwrap()
            .booking;
        let err = check_in(&done, checkin(50200), dt("2025-06-03T17:05:00")).unwrap_err();
        assert_eq!(err, BookingError::conflict("Booking has already been checked in"));
    }

    #[test]
    fn zero_mileage_is_rejected_before_state_checks() {
        let err = check_in(&confirmed(), checkin(0), dt("2025-06-03T17:00:00")).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[test]
    fn mileage_keeps_the_stored_scale() {
        assert_eq!(
            validate_mileage("Return mileage", Decimal::new(500005, 1)),
            Ok(Decimal::new(500005, 1))
        );
        assert_eq!(
            validate_mileage("Return mileage", Decimal::new(5000000, 2)),
            Ok(Decimal::new(5000000, 2))
        );
        assert_eq!(
            validate_mileage("Return mileage", Decimal::new(5000005, 2)),
            Err(BookingError::validation(
                "Return mileage must have at most one decimal place"
            ))
        );
        assert_eq!(
            validate_mileage("Checkout mileage", Decimal::new(1, 3)),
            Err(BookingError::validation(
                "Checkout mileage must have at most one decimal place"
            ))
        );
    }

    #[test]
    fn fractional_mileage_just_below_minimum_is_not_rounded_up() {
        let result = check_out(
            &confirmed(),
            &vehicle(),
            CheckoutCommand {
                mileage: Decimal::new(4999999, 2),
                notes: None,
            },
            dt("2025-06-01T09:00:00"),
        );
        assert!(matches!(result, Err(BookingError::Validation(_))));

        let command = CheckinCommand {
            mileage: Decimal::new(499999, 1),
            ..checkin(50000)
        };
        assert_eq!(
            check_in(&checked_out(), command, dt("2025-06-03T17:00:00"))
                .unwrap_err()
                .to_string(),
            "Return mileage must be at least 50000"
        );
    }
}
