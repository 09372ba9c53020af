//! Field validation for account and store payloads. Everything returns
//! `AppError::Validation`, which renders as a 400 with the message as-is.
use crate::error::AppError;

pub fn name(value: &str) -> Result<(), AppError> {
    let len = value.trim().chars().count();

    if (2..=60).contains(&len) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Name must be between 2 and 60 characters".to_string(),
        ))
    }
}

pub fn email(value: &str) -> Result<(), AppError> {
    let valid = value.len() <= 254
        && !value.contains(char::is_whitespace)
        && value
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            });

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(
            "A valid email address is required".to_string(),
        ))
    }
}

pub fn address(value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation("Address is required".to_string()));
    }

    if value.chars().count() > 400 {
        return Err(AppError::Validation(
            "Address must be at most 400 characters".to_string(),
        ));
    }

    Ok(())
}

pub fn password(value: &str) -> Result<(), AppError> {
    if (8..=64).contains(&value.chars().count()) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Password must be between 8 and 64 characters".to_string(),
        ))
    }
}

pub fn account(
    name_value: &str,
    email_value: &str,
    address_value: &str,
    password_value: &str,
) -> Result<(), AppError> {
    name(name_value)?;
    email(email_value)?;
    address(address_value)?;
    password(password_value)
}
