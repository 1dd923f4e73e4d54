use crate::config::PhoneMode;

/// Normalizes a North American phone number to `+1XXXXXXXXXX`.
///
/// Accepts `(123) 456-7890`, `123-456-7890`, `1234567890`, `1 123 456 7890`
/// and similar. Anything that does not reduce to 10 digits, or 11 digits with
/// a leading `1`, yields `None`; a bad phone never blocks a submission.
pub fn normalize_nanp_phone(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => Some(format!("+1{}", digits)),
        11 if digits.starts_with('1') => Some(format!("+{}", digits)),
        0 => None,
        _ => {
            tracing::debug!("Discarding phone with {} digits", digits.len());
            None
        }
    }
}

/// Phone values derived from one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPhone {
    /// What gets persisted, depending on [`PhoneMode`].
    pub stored: Option<String>,
    /// Normalized form, the only value ever sent to the CRM.
    pub dialable: Option<String>,
}

pub fn resolve_phone(raw: Option<&str>, mode: PhoneMode) -> ResolvedPhone {
    let raw = raw.map(str::trim).filter(|p| !p.is_empty());
    let dialable = normalize_nanp_phone(raw);

    let stored = match mode {
        PhoneMode::Normalize => dialable.clone(),
        PhoneMode::Raw => raw.map(str::to_string),
    };

    ResolvedPhone { stored, dialable }
}
