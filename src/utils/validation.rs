//! Utilidades de validación
//! 
//! Validadores personalizados para los DTOs (`validator`).

use validator::ValidationError;

use crate::services::booking_lifecycle::MAX_NOTES_LENGTH;

/// Validar que un string no esté vacío (ni solo espacios)
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar longitud mínima y máxima (en caracteres)
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        let mut error = ValidationError::new("length");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &len);
        return Err(error);
    }
    Ok(())
}

/// Notas libres de entrega y de daños
pub fn validate_notes(value: &str) -> Result<(), ValidationError> {
    validate_length(value.trim(), 0, MAX_NOTES_LENGTH)
}
