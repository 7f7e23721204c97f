//! Patient model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{
    ADDRESS_MAX, ValidationErrors, non_blank, validate_age, validate_email, validate_max_len,
    validate_name, validate_phone,
};

/// Patient entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub phone: Option<String>,
    pub email: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated patient fields, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub age: i32,
    pub phone: Option<String>,
    pub email: String,
    pub address: Option<String>,
}

/// Patient creation or replacement payload as received over the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientPayload {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl PatientPayload {
    /// Check every field and produce the normalised record
    pub fn validate(&self) -> Result<NewPatient, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.as_deref().unwrap_or_default().trim().to_string();
        errors.check("name", validate_name(&name));

        let age = match self.age {
            Some(age) => {
                errors.check("age", validate_age(age));
                i32::try_from(age).unwrap_or_default()
            }
            None => {
                errors.add("age", "Age is required");
                0
            }
        };

        let phone = non_blank(self.phone.as_deref());
        if let Some(phone) = &phone {
            errors.check("phone", validate_phone(phone));
        }

        let email = self
            .email
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        errors.check("email", validate_email(&email));

        let address = non_blank(self.address.as_deref());
        if let Some(address) = &address {
            errors.check("address", validate_max_len(address, ADDRESS_MAX, "Address"));
        }

        errors.finish(|| NewPatient {
            name,
            age,
            phone,
            email,
            address,
        })
    }
}
