//! Customer domain model.
//!
//! # Responsibility
//! - Define the customer record shared by repository, store and UI bindings.
//! - Define the creation input and the shallow-merge patch shape.
//!
//! # Invariants
//! - `id` is assigned by the repository and never changes afterwards.
//! - `visit_count`, `total_spent` and `last_visit` are never caller-supplied
//!   on creation; they start from repository defaults.
//! - `total_spent` is finite and non-negative.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable customer identifier (UUID text assigned on create).
pub type CustomerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Storage and wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parses a storage/wire label, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer record as held in storage and in the in-memory list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub gender: Gender,
    pub visit_count: u32,
    pub total_spent: f64,
    /// Date/time text of the latest visit. Empty until the first visit is recorded.
    pub last_visit: String,
    pub preferred_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Photo path or encoded reference.
    pub photo: String,
}

/// Caller input for creating a customer.
///
/// Carries every [`Customer`] field except the repository-owned ones
/// (`id`, `visit_count`, `total_spent`, `last_visit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub gender: Gender,
    pub preferred_services: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub photo: String,
}

impl NewCustomer {
    /// Builds the stored record with repository defaults for omitted fields.
    pub fn into_customer(self, id: impl Into<CustomerId>) -> Customer {
        Customer {
            id: id.into(),
            name: self.name,
            phone: self.phone,
            email: self.email,
            gender: self.gender,
            visit_count: 0,
            total_spent: 0.0,
            last_visit: String::new(),
            preferred_services: self.preferred_services,
            notes: self.notes,
            photo: self.photo,
        }
    }
}

/// Partial overwrite applied with shallow-merge semantics.
///
/// `None` keeps the prior value. `notes: Some(None)` clears notes.
/// The identifier is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub visit_count: Option<u32>,
    pub total_spent: Option<f64>,
    pub last_visit: Option<String>,
    pub preferred_services: Option<Vec<String>>,
    pub notes: Option<Option<String>>,
    pub photo: Option<String>,
}

impl CustomerPatch {
    /// Returns whether the patch would leave any record unchanged.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overwrites each present field on `customer`; absent fields are untouched.
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name.clone_from(name);
        }
        if let Some(phone) = &self.phone {
            customer.phone.clone_from(phone);
        }
        if let Some(email) = &self.email {
            customer.email.clone_from(email);
        }
        if let Some(gender) = self.gender {
            customer.gender = gender;
        }
        if let Some(visit_count) = self.visit_count {
            customer.visit_count = visit_count;
        }
        if let Some(total_spent) = self.total_spent {
            customer.total_spent = total_spent;
        }
        if let Some(last_visit) = &self.last_visit {
            customer.last_visit.clone_from(last_visit);
        }
        if let Some(services) = &self.preferred_services {
            customer.preferred_services.clone_from(services);
        }
        if let Some(notes) = &self.notes {
            customer.notes.clone_from(notes);
        }
        if let Some(photo) = &self.photo {
            customer.photo.clone_from(photo);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomerValidationError {
    EmptyId,
    EmptyName,
    InvalidTotalSpent(f64),
}

impl Display for CustomerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "customer id cannot be empty"),
            Self::EmptyName => write!(f, "customer name cannot be empty"),
            Self::InvalidTotalSpent(value) => write!(
                f,
                "customer total_spent must be a finite non-negative amount, got {value}"
            ),
        }
    }
}

impl Error for CustomerValidationError {}

impl Customer {
    /// Checks record-level invariants before persistence or after read-back.
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.id.trim().is_empty() {
            return Err(CustomerValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }
        if !self.total_spent.is_finite() || self.total_spent < 0.0 {
            return Err(CustomerValidationError::InvalidTotalSpent(self.total_spent));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Customer, CustomerPatch, CustomerValidationError, Gender, NewCustomer};

    fn ana() -> Customer {
        NewCustomer {
            name: "Ana".to_string(),
            phone: "555-0100".to_string(),
            email: "ana@example.com".to_string(),
            gender: Gender::Female,
            preferred_services: vec!["haircut".to_string()],
            notes: Some("prefers mornings".to_string()),
            photo: String::new(),
        }
        .into_customer("1")
    }

    #[test]
    fn into_customer_applies_repository_defaults() {
        let customer = ana();
        assert_eq!(customer.id, "1");
        assert_eq!(customer.visit_count, 0);
        assert_eq!(customer.total_spent, 0.0);
        assert_eq!(customer.last_visit, "");
        assert_eq!(customer.preferred_services, vec!["haircut"]);
    }

    #[test]
    fn patch_overwrites_only_present_fields() {
        let before = ana();
        let mut after = before.clone();
        CustomerPatch {
            total_spent: Some(150.0),
            ..CustomerPatch::default()
        }
        .apply_to(&mut after);

        assert_eq!(after.total_spent, 150.0);
        assert_eq!(
            Customer {
                total_spent: before.total_spent,
                ..after
            },
            before
        );
    }

    #[test]
    fn patch_can_clear_notes() {
        let mut customer = ana();
        CustomerPatch {
            notes: Some(None),
            ..CustomerPatch::default()
        }
        .apply_to(&mut customer);
        assert_eq!(customer.notes, None);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(CustomerPatch::default().is_empty());
        let patch = CustomerPatch {
            phone: Some("555".to_string()),
            ..CustomerPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_amounts() {
        let mut customer = ana();
        customer.name = "   ".to_string();
        assert_eq!(customer.validate(), Err(CustomerValidationError::EmptyName));

        let mut customer = ana();
        customer.total_spent = -1.0;
        assert!(matches!(
            customer.validate(),
            Err(CustomerValidationError::InvalidTotalSpent(_))
        ));

        let mut customer = ana();
        customer.total_spent = f64::NAN;
        assert!(customer.validate().is_err());
    }

    #[test]
    fn gender_labels_roundtrip_through_parse() {
        assert_eq!(Gender::parse(" Male "), Some(Gender::Male));
        assert_eq!(Gender::parse(Gender::Female.as_str()), Some(Gender::Female));
        assert_eq!(Gender::parse("other"), None);
    }

    #[test]
    fn customer_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(ana()).unwrap();
        assert_eq!(json["visitCount"], 0);
        assert_eq!(json["preferredServices"][0], "haircut");
        assert_eq!(json["gender"], "female");
    }
}
