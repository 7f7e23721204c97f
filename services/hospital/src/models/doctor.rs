//! Doctor model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{
    ValidationErrors, non_blank, validate_email, validate_name, validate_phone,
    validate_specialization,
};

/// Doctor entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub phone: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated doctor fields, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoctor {
    pub name: String,
    pub specialization: String,
    pub phone: Option<String>,
    pub email: String,
}

/// Doctor creation or replacement payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorPayload {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl DoctorPayload {
    pub fn validate(&self) -> Result<NewDoctor, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = self.name.as_deref().unwrap_or_default().trim().to_string();
        errors.check("name", validate_name(&name));

        let specialization = self
            .specialization
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string();
        errors.check("specialization", validate_specialization(&specialization));

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

        errors.finish(|| NewDoctor {
            name,
            specialization,
            phone,
            email,
        })
    }
}
