//! Structural checks on a registry document.

use std::collections::HashSet;

use crate::schema::{DEFAULT_TANK_ID, RegistryDoc, TankDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Document has no 'default' tank")]
    MissingDefault,

    #[error("Duplicate tank id: {id}")]
    DuplicateId { id: String },

    #[error("Invalid value in tank '{tank}': {field} = {value} ({reason})")]
    InvalidValue {
        tank: String,
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Tank '{tank}' has {heights} heights but {volumes} volumes")]
    LengthMismatch {
        tank: String,
        heights: usize,
        volumes: usize,
    },
}

pub fn validate_document(doc: &RegistryDoc) -> Result<(), DocumentError> {
    let mut ids = HashSet::new();
    for (id, tank) in &doc.tanks {
        if id.trim().is_empty() {
            return Err(DocumentError::InvalidValue {
                tank: id.clone(),
                field: "id",
                value: format!("{id:?}"),
                reason: "must not be blank",
            });
        }
        if !ids.insert(id.as_str()) {
            return Err(DocumentError::DuplicateId { id: id.clone() });
        }
        validate_tank(id, tank)?;
    }

    if !ids.contains(DEFAULT_TANK_ID) {
        return Err(DocumentError::MissingDefault);
    }
    Ok(())
}

fn validate_tank(id: &str, tank: &TankDef) -> Result<(), DocumentError> {
    positive(id, "D", tank.diameter)?;
    positive(id, "L", tank.length)?;

    if tank.heights.len() != tank.volumes.len() {
        return Err(DocumentError::LengthMismatch {
            tank: id.to_string(),
            heights: tank.heights.len(),
            volumes: tank.volumes.len(),
        });
    }

    for &h in &tank.heights {
        finite(id, "_training_heights", h)?;
    }
    for &v in &tank.volumes {
        finite(id, "_training_galones", v)?;
    }
    Ok(())
}

fn positive(tank: &str, field: &'static str, value: f64) -> Result<(), DocumentError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DocumentError::InvalidValue {
            tank: tank.to_string(),
            field,
            value: value.to_string(),
            reason: "must be a positive number",
        })
    }
}

fn finite(tank: &str, field: &'static str, value: f64) -> Result<(), DocumentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DocumentError::InvalidValue {
            tank: tank.to_string(),
            field,
            value: value.to_string(),
            reason: "must be finite",
        })
    }
}
