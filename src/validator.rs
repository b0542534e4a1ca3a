// src/validator.rs - Form-layer validation, run before anything reaches the mutation engine
use std::collections::BTreeMap;
use serde::Serialize;
use validator::{Validate, ValidationErrors};
use crate::error::ApiError;
use crate::models::{ChemicalLot, CreateChemicalRequest, ReadingFields, RecordUsageRequest};

const MAX_QUANTITY: f64 = 1e9;

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, Vec<String>>,
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add_error(field, message);
        }
    }

    /// Folds derive-level (`#[validate(..)]`) failures into this result.
    pub fn absorb(&mut self, errors: &ValidationErrors) {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                self.add_error(field.to_string(), message);
            }
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let message = self.errors
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        ApiError::ValidationError(message)
    }

    /// `Ok` with any warnings, or the errors as a 422.
    pub fn into_result(self) -> Result<BTreeMap<String, Vec<String>>, ApiError> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(self.to_api_error())
        }
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_blank(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{} cannot be empty", field))
        } else {
            Ok(())
        }
    }

    pub fn min_trimmed_length(value: &str, field: &str, min: usize) -> Result<(), String> {
        if value.trim().chars().count() < min {
            Err(format!("{} must be at least {} characters", field, min))
        } else {
            Ok(())
        }
    }

    pub fn quantity(value: f64) -> Result<(), String> {
        if !value.is_finite() || value <= 0.0 {
            Err("Quantity must be a positive number".to_string())
        } else if value > MAX_QUANTITY {
            Err("Quantity too large".to_string())
        } else {
            Ok(())
        }
    }

    pub fn reading(value: Option<f64>) -> Result<(), String> {
        match value {
            Some(v) if !v.is_finite() || v < 0.0 => Err("Deepwell reading cannot be negative".to_string()),
            _ => Ok(()),
        }
    }
}

// ==================== FORMS ====================

pub fn validate_new_chemical(request: &CreateChemicalRequest) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Err(errors) = request.validate() {
        result.absorb(&errors);
    }

    result.check("name", FieldValidator::not_blank(&request.name, "Name"));
    result.check("supplier", FieldValidator::not_blank(&request.supplier, "Supplier"));
    result.check("storage_location", FieldValidator::not_blank(&request.storage_location, "Storage location"));
    result.check("quantity", FieldValidator::quantity(request.quantity));

    if request.expiry_date < request.date_received {
        result.add_warning("expiry_date", "Expiry date is earlier than the date received");
    }

    dedup(&mut result);
    result
}

/// Checks a usage form against the lot it draws from.
///
/// An unknown lot is a hard 404 here; the mutation engine itself would accept it.
pub fn validate_usage(request: &RecordUsageRequest, lot: Option<&ChemicalLot>) -> Result<(), ApiError> {
    let mut result = ValidationResult::new();

    if let Err(errors) = request.validate() {
        result.absorb(&errors);
    }
    result.check("person_in_charge", FieldValidator::not_blank(&request.person_in_charge, "Person in charge"));
    result.check("quantity_used", FieldValidator::quantity(request.quantity_used));
    dedup(&mut result);

    if !result.is_valid() {
        return Err(result.to_api_error());
    }

    let lot = lot.ok_or_else(|| ApiError::chemical_not_found(&request.chemical_id))?;

    if request.quantity_used > lot.current_balance {
        return Err(ApiError::insufficient_quantity(lot.current_balance, request.quantity_used));
    }

    Ok(())
}

pub fn validate_reading_fields(fields: &ReadingFields) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Err(errors) = fields.validate() {
        result.absorb(&errors);
    }
    result.check("operator", FieldValidator::min_trimmed_length(&fields.operator, "Operator name", 2));
    result.check("deepwell_1", FieldValidator::reading(fields.deepwell_1));
    result.check("deepwell_2", FieldValidator::reading(fields.deepwell_2));

    dedup(&mut result);
    result
}

fn dedup(result: &mut ValidationResult) {
    for messages in result.errors.values_mut() {
        messages.sort();
        messages.dedup();
    }
}
