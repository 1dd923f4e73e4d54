use serde::{Deserialize, Serialize};

/// Raw lead form exactly as posted by the website.
///
/// Every field is optional here; presence and content are checked by
/// [`crate::validation::validate_lead`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadForm {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    /// Used instead of `firstname`/`lastname` when the deployment collects a full name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Consent checkbox; browsers send `on` when it is ticked.
    #[serde(default, rename = "confirm-policies")]
    pub confirm_policies: Option<String>,
    /// Turnstile widget token.
    #[serde(default, rename = "cf-turnstile-response")]
    pub captcha_response: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactName {
    Split { first: String, last: String },
    Full(String),
}

impl ContactName {
    /// First/last pair for systems that want split names. A full name is split
    /// at the first whitespace; a single word yields an empty last name.
    pub fn parts(&self) -> (&str, &str) {
        match self {
            ContactName::Split { first, last } => (first.as_str(), last.as_str()),
            ContactName::Full(full) => match full.split_once(char::is_whitespace) {
                Some((first, rest)) => (first, rest.trim_start()),
                None => (full.as_str(), ""),
            },
        }
    }
}

/// A lead form that passed validation. All strings are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLead {
    pub name: ContactName,
    pub email: String,
    /// Phone as typed, `None` when left blank.
    pub phone: Option<String>,
    pub captcha_token: String,
}

/// Durable record of an accepted lead. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub name: ContactName,
    pub email: String,
    pub phone: Option<String>,
    /// Unix seconds, assigned by the server.
    pub created_at: i64,
    pub crm_profile_id: Option<String>,
}

/// Body returned for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub external_profile_id: Option<String>,
}
