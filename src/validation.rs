//! Lead form validation.
//!
//! All constraints are checked before any side effect; a form either passes
//! completely or is rejected with every failing field listed.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::NameMode;
use crate::errors::ValidationError;
use crate::models::{ContactName, LeadForm, ValidatedLead};

/// Value browsers submit for a ticked checkbox without an explicit `value`.
pub const CONSENT_GIVEN: &str = "on";

const MAX_EMAIL_LEN: usize = 254;

/// Validate email address
///
/// Simplified RFC 5322: `local@domain.tld`, with at least one dot-separated
/// label after the domain.
pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$"
        )
        .unwrap();
    }

    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Trimmed, non-empty value of an optional form field.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Checks a raw lead form and coerces it into a [`ValidatedLead`].
pub fn validate_lead(form: &LeadForm, name_mode: NameMode) -> Result<ValidatedLead, ValidationError> {
    let mut errors = ValidationError::default();

    let name = match name_mode {
        NameMode::Split => {
            let first = present(&form.firstname);
            let last = present(&form.lastname);
            if first.is_none() {
                errors.push("firstname", "First name is required");
            }
            if last.is_none() {
                errors.push("lastname", "Last name is required");
            }
            first.zip(last).map(|(first, last)| ContactName::Split {
                first: first.to_string(),
                last: last.to_string(),
            })
        }
        NameMode::Full => {
            let full = present(&form.name);
            if full.is_none() {
                errors.push("name", "Name is required");
            }
            full.map(|full| ContactName::Full(full.to_string()))
        }
    };

    let email = present(&form.email).filter(|email| is_valid_email(email));
    if email.is_none() {
        errors.push("email", "Invalid email address");
    }

    if form.confirm_policies.as_deref() != Some(CONSENT_GIVEN) {
        errors.push(
            "confirm-policies",
            "You must consent to providing your information",
        );
    }

    let captcha_token = present(&form.captcha_response);
    if captcha_token.is_none() {
        errors.push("cf-turnstile-response", "CAPTCHA verification is required");
    }

    match (name, email, captcha_token) {
        (Some(name), Some(email), Some(captcha_token)) if errors.is_empty() => Ok(ValidatedLead {
            name,
            email: email.to_string(),
            phone: present(&form.phone).map(str::to_string),
            captcha_token: captcha_token.to_string(),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> LeadForm {
        LeadForm {
            firstname: Some("Ada".to_string()),
            lastname: Some("Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: Some("(123) 456-7890".to_string()),
            confirm_policies: Some("on".to_string()),
            captcha_response: Some("token".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_split_form() {
        let lead = validate_lead(&valid_form(), NameMode::Split).unwrap();

        assert_eq!(
            lead.name,
            ContactName::Split {
                first: "Ada".to_string(),
                last: "Lovelace".to_string()
            }
        );
        assert_eq!(lead.email, "ada@example.com");
        assert_eq!(lead.phone.as_deref(), Some("(123) 456-7890"));
        assert_eq!(lead.captcha_token, "token");
    }

    #[test]
    fn test_values_are_trimmed() {
        let mut form = valid_form();
        form.firstname = Some("  Ada ".to_string());
        form.email = Some(" ada@example.com ".to_string());
        form.phone = Some("   ".to_string());

        let lead = validate_lead(&form, NameMode::Split).unwrap();
        assert_eq!(lead.name.parts().0, "Ada");
        assert_eq!(lead.email, "ada@example.com");
        assert_eq!(lead.phone, None);
    }

    #[test]
    fn test_full_name_mode() {
        let mut form = valid_form();
        form.firstname = None;
        form.lastname = None;
        form.name = Some("Ada Lovelace".to_string());

        let lead = validate_lead(&form, NameMode::Full).unwrap();
        assert_eq!(lead.name, ContactName::Full("Ada Lovelace".to_string()));

        // split fields are not required in full mode, but name is
        form.name = Some(" ".to_string());
        let err = validate_lead(&form, NameMode::Full).unwrap_err();
        assert!(err.has_field("name"));
        assert!(!err.has_field("firstname"));
    }

    #[test]
    fn test_collects_every_issue() {
        let form = LeadForm {
            firstname: Some(" ".to_string()),
            email: Some("not-an-email".to_string()),
            confirm_policies: Some("yes".to_string()),
            ..Default::default()
        };

        let err = validate_lead(&form, NameMode::Split).unwrap_err();
        let fields: Vec<&str> = err.issues.iter().map(|i| i.field).collect();
        assert_eq!(
            fields,
            vec![
                "firstname",
                "lastname",
                "email",
                "confirm-policies",
                "cf-turnstile-response"
            ]
        );
    }

    #[test]
    fn test_consent_must_be_exactly_on() {
        for value in [None, Some("ON"), Some("true"), Some(" on"), Some("")] {
            let mut form = valid_form();
            form.confirm_policies = value.map(str::to_string);
            let err = validate_lead(&form, NameMode::Split).unwrap_err();
            assert!(err.has_field("confirm-policies"), "accepted {:?}", value);
        }
    }

    #[test]
    fn test_email_grammar() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("first.last@sub-domain.example.org"));
        assert!(is_valid_email("a@b.co"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@-example.com"));
        assert!(!is_valid_email(&format!("{}@example.com", "a".repeat(250))));
    }
}
