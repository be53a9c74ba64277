use crate::models::opinion::{OpinionForm, Stance};

pub const NAME_MAX_LEN: usize = 100;
pub const OPINION_MAX_LEN: usize = 2000;

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// A submission that passed the form checks, with text fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub name: String,
    pub partner: String,
    pub stance: Stance,
    pub opinion: String,
}

/// Check every field of the opinion form, collecting all problems at once.
pub fn validate_opinion_form(form: &OpinionForm) -> Result<ValidSubmission, Vec<String>> {
    let mut errors = Vec::new();

    if let Some(e) = validate_required(&form.name, "Your name", NAME_MAX_LEN) {
        errors.push(e);
    }
    if let Some(e) = validate_required(&form.partner, "Partner's name", NAME_MAX_LEN) {
        errors.push(e);
    }
    let stance = match form.stance.trim() {
        "" => Some(Stance::default()),
        s => match s.parse::<Stance>() {
            Ok(stance) => Some(stance),
            Err(_) => {
                errors.push("Please choose beneficial, detrimental or neutral".to_string());
                None
            }
        },
    };
    if let Some(e) = validate_required(&form.opinion, "Opinion", OPINION_MAX_LEN) {
        errors.push(e);
    }

    match stance {
        Some(stance) if errors.is_empty() => Ok(ValidSubmission {
            name: form.name.trim().to_string(),
            partner: form.partner.trim().to_string(),
            stance,
            opinion: form.opinion.trim().to_string(),
        }),
        _ => Err(errors),
    }
}
