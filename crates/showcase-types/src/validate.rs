//! Form validation shared by the client (before any network call) and the
//! API handlers (which re-check the same rules).

use std::sync::LazyLock;

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn project(title: &str, description: &str) -> Result<(), String> {
    if title.trim().is_empty() || description.trim().is_empty() {
        return Err("Title and description are required.".into());
    }
    Ok(())
}

pub fn login(email: &str, password: &str) -> Result<(), String> {
    if !is_valid_email(email) {
        return Err("Please enter a valid email address.".into());
    }
    if password.is_empty() {
        return Err("Password is required.".into());
    }
    Ok(())
}

pub fn password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    Ok(())
}

/// Signup rules. `accepted_terms` is `None` on forms that do not ask for
/// terms-of-service acknowledgement.
pub fn signup(
    full_name: &str,
    email: &str,
    pw: &str,
    accepted_terms: Option<bool>,
) -> Result<(), String> {
    if full_name.trim().is_empty() {
        return Err("Name is required.".into());
    }
    if !is_valid_email(email) {
        return Err("Please enter a valid email address.".into());
    }
    password(pw)?;
    if accepted_terms == Some(false) {
        return Err("You must accept the terms of service.".into());
    }
    Ok(())
}

pub fn recovery_email(email: &str) -> Result<(), String> {
    if !is_valid_email(email) {
        return Err("Please enter your email to reset password.".into());
    }
    Ok(())
}
