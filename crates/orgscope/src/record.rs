//! The assembled entity record and its wire layout.
//!
//! Field names are the public JSON contract; do not rename them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One extracted company profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub company_info: CompanyInfo,
    pub recent_publications: Vec<Publication>,
    pub similar_companies: Vec<RelatedEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub company_name: String,
    pub company_slogan: String,
    pub company_website: String,
    /// Final profile URL after redirects.
    pub company_linkedin_url: String,
    pub founded_year: Option<i32>,
    pub specialties: String,
    pub industry: String,
    pub headquarters: String,
    pub company_address: CompanyAddress,
    pub company_description: String,
    /// `numberOfEmployees.value` with its JSON type kept (number or
    /// string), `""` when absent.
    pub number_of_employees: serde_json::Value,
    /// Follower count as digits, `"0"` when unknown.
    pub followers: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAddress {
    pub full_address: String,
    pub street_address: String,
    pub address_locality: String,
    pub postal_code: String,
    pub country: String,
}

/// A recent post. `date` serializes as `YYYY-MM-DD`, or `null` if the
/// timestamp could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub date: Option<NaiveDate>,
    pub text: String,
    pub url: String,
}

/// A company linked from the profile's "similar pages" list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    pub industry: String,
    pub location: String,
    pub url: String,
}

/// Error payload returned alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Success payload: a single-element array.
pub fn response_body(record: EntityRecord) -> Vec<EntityRecord> {
    vec![record]
}
