//! Catalog of PII categories the detection service reports.
//!
//! Detections carry the subcategory `id` as an opaque string. Subcategories
//! marked `critical` are redacted automatically once detected.

/// A group of related subcategories.
#[derive(Debug, Clone, Copy)]
pub struct RedactionCategory {
    pub id: &'static str,
    pub label: &'static str,
    pub subcategories: &'static [RedactionSubcategory],
}

#[derive(Debug, Clone, Copy)]
pub struct RedactionSubcategory {
    pub id: &'static str,
    pub label: &'static str,
    /// Auto-redact when detected.
    pub critical: bool,
}

const fn sub(id: &'static str, label: &'static str, critical: bool) -> RedactionSubcategory {
    RedactionSubcategory {
        id,
        label,
        critical,
    }
}

pub const REDACTION_CATEGORIES: &[RedactionCategory] = &[
    RedactionCategory {
        id: "personal-identifiers",
        label: "Personal Identifiers",
        subcategories: &[
            sub("full-names", "Full Names", true),
            sub("first-names", "First Names", true),
            sub("last-names", "Last Names", true),
        ],
    },
    RedactionCategory {
        id: "contact-information",
        label: "Contact Information",
        subcategories: &[
            sub("phone-numbers", "Phone Numbers", true),
            sub("email-addresses", "Email Addresses", false),
            sub("physical-addresses", "Physical Addresses", true),
        ],
    },
    RedactionCategory {
        id: "location-information",
        label: "Location Information",
        subcategories: &[
            sub("street-names", "Street Names", false),
            sub("city-names", "City Names", false),
            sub("state-names", "State Names", false),
            sub("zip-codes", "Zip Codes", false),
            sub("landmarks", "Landmarks", false),
        ],
    },
    RedactionCategory {
        id: "vehicle-information",
        label: "Vehicle Information",
        subcategories: &[
            sub("license-plates", "License Plate Numbers", true),
            sub("vehicle-make-model", "Make and Model", false),
            sub("vin-numbers", "VIN Numbers", false),
            sub("vehicle-colors", "Vehicle Colors", false),
        ],
    },
    RedactionCategory {
        id: "government-ids",
        label: "Government IDs",
        subcategories: &[
            sub("ssn", "Social Security Numbers", true),
            sub("drivers-license", "Driver's License Numbers", true),
            sub("passport-numbers", "Passport Numbers", false),
        ],
    },
    RedactionCategory {
        id: "financial-information",
        label: "Financial Information",
        subcategories: &[
            sub("credit-cards", "Credit Card Numbers", false),
            sub("bank-accounts", "Bank Account Numbers", false),
        ],
    },
    RedactionCategory {
        id: "dates-times",
        label: "Dates & Times",
        subcategories: &[
            sub("birth-dates", "Birth Dates", true),
            sub("specific-dates", "Specific Dates", false),
            sub("exact-times", "Exact Times", false),
        ],
    },
    RedactionCategory {
        id: "organizations",
        label: "Organizations",
        subcategories: &[
            sub("company-names", "Company Names", false),
            sub("organization-names", "Organization Names", false),
        ],
    },
];

fn all_subcategories() -> impl Iterator<Item = &'static RedactionSubcategory> {
    REDACTION_CATEGORIES
        .iter()
        .flat_map(|c| c.subcategories.iter())
}

/// Look up a subcategory by ID.
pub fn find_subcategory(id: &str) -> Option<&'static RedactionSubcategory> {
    all_subcategories().find(|s| s.id == id)
}

/// Whether detections in this subcategory are auto-redacted.
///
/// Unknown categories are never critical.
pub fn is_critical(id: &str) -> bool {
    find_subcategory(id).is_some_and(|s| s.critical)
}

pub fn critical_subcategory_ids() -> Vec<&'static str> {
    all_subcategories()
        .filter(|s| s.critical)
        .map(|s| s.id)
        .collect()
}
