//! crates/orbit_core/src/validation.rs
//!
//! Client-side checks that run before any request is sent.

use crate::domain::ProfileData;
use crate::ports::{PortError, PortResult};

pub const MIN_PASSWORD_LEN: usize = 8;

const PDF_MAGIC: &[u8] = b"%PDF";

pub fn validate_login(email: &str, password: &str) -> PortResult<()> {
    if email.trim().is_empty() {
        return Err(PortError::Validation("Please enter your email".to_string()));
    }
    if password.is_empty() {
        return Err(PortError::Validation("Please enter your password".to_string()));
    }
    Ok(())
}

pub fn validate_registration(email: &str, password: &str, name: &str) -> PortResult<()> {
    validate_login(email, password)?;
    if !email.contains('@') {
        return Err(PortError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PortError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if name.trim().is_empty() {
        return Err(PortError::Validation("Please enter your name".to_string()));
    }
    Ok(())
}

/// Only the education block is required; everything else may be empty.
pub fn validate_profile(data: &ProfileData) -> PortResult<()> {
    let education = &data.education;
    let required = [
        ("degree", &education.degree),
        ("major", &education.major),
        ("institution", &education.institution),
        ("year", &education.year),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| *field)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PortError::Validation(format!(
            "Missing required education fields: {}",
            missing.join(", ")
        )))
    }
}

pub fn validate_search_query(query: &str) -> PortResult<()> {
    if query.trim().is_empty() {
        return Err(PortError::Validation(
            "Please enter something to search for".to_string(),
        ));
    }
    Ok(())
}

/// Resumes must be PDFs, checked by name and by content.
pub fn validate_resume(file_name: &str, contents: &[u8]) -> PortResult<()> {
    let is_pdf_name = file_name.to_ascii_lowercase().ends_with(".pdf");
    if !is_pdf_name || !contents.starts_with(PDF_MAGIC) {
        return Err(PortError::Validation("Please upload a PDF file".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Education;

    #[test]
    fn login_requires_both_fields() {
        assert!(validate_login("", "secret").is_err());
        assert!(validate_login("a@b.c", "").is_err());
        assert!(validate_login("a@b.c", "x").is_ok());
    }

    #[test]
    fn registration_enforces_password_length() {
        let err = validate_registration("a@b.c", "short", "Asha").unwrap_err();
        assert_eq!(
            err,
            PortError::Validation("Password must be at least 8 characters".to_string())
        );
        assert!(validate_registration("a@b.c", "longenough", "Asha").is_ok());
        assert!(validate_registration("a@b.c", "longenough", " ").is_err());
        assert!(validate_registration("not-an-email", "longenough", "Asha").is_err());
    }

    #[test]
    fn profile_lists_missing_education_fields() {
        let data = ProfileData {
            education: Education {
                degree: "B.Tech".into(),
                major: String::new(),
                institution: "IIT".into(),
                year: " ".into(),
                cgpa_or_percentage: String::new(),
            },
            ..ProfileData::default()
        };
        let err = validate_profile(&data).unwrap_err();
        assert_eq!(
            err,
            PortError::Validation("Missing required education fields: major, year".to_string())
        );
    }

    #[test]
    fn profile_does_not_require_skills_or_grades() {
        let data = ProfileData {
            education: Education {
                degree: "B.Tech".into(),
                major: "CSE".into(),
                institution: "IIT".into(),
                year: "2nd year".into(),
                cgpa_or_percentage: String::new(),
            },
            ..ProfileData::default()
        };
        assert!(validate_profile(&data).is_ok());
    }

    #[test]
    fn resume_must_be_a_pdf() {
        assert!(validate_resume("cv.pdf", b"%PDF-1.7 ...").is_ok());
        assert!(validate_resume("cv.docx", b"%PDF-1.7").is_err());
        assert!(validate_resume("cv.pdf", b"PK\x03\x04").is_err());
    }
}
