use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::wizard::models::UserProfile;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9.-]+$").expect("valid email regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Raw details form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsForm {
    pub name: String,
    pub email: String,
    pub profession: String,
}

/// Trims the form and checks every field. The error lists the offending fields.
pub fn validate_details(form: &DetailsForm) -> Result<UserProfile, String> {
    let name = form.name.trim();
    let email = form.email.trim();
    let profession = form.profession.trim();

    let mut invalid = Vec::new();
    if name.is_empty() {
        invalid.push("name");
    }
    if !is_valid_email(email) {
        invalid.push("email");
    }
    if profession.is_empty() {
        invalid.push("profession");
    }

    if !invalid.is_empty() {
        return Err(format!(
            "Please provide a valid name, email, and profession (invalid: {})",
            invalid.join(", ")
        ));
    }

    Ok(UserProfile {
        name: name.to_string(),
        email: email.to_string(),
        profession: profession.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, profession: &str) -> DetailsForm {
        DetailsForm {
            name: name.to_string(),
            email: email.to_string(),
            profession: profession.to_string(),
        }
    }

    #[test]
    fn test_email_accepts_short_domain() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
    }

    #[test]
    fn test_email_rejects_missing_tld() {
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
    }

    #[test]
    fn test_validate_details_trims_fields() {
        let profile = validate_details(&form("  Asha ", "asha@example.com ", " Teacher")).unwrap();
        assert_eq!(profile.name, "Asha");
        assert_eq!(profile.email, "asha@example.com");
        assert_eq!(profile.profession, "Teacher");
    }

    #[test]
    fn test_validate_details_names_every_bad_field() {
        let err = validate_details(&form(" ", "a@b", "")).unwrap_err();
        assert!(err.contains("name, email, profession"), "{err}");
    }
}
