use super::ApiError;

pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Validate and normalize an email address: requires a non-empty local part
/// and domain, and lowercases the domain half.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();

    let Some((local, domain)) = trimmed.rsplit_once('@') else {
        return Err(ApiError::validation("Enter a valid email address"));
    };

    if local.is_empty() || domain.is_empty() {
        return Err(ApiError::validation("Enter a valid email address"));
    }

    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(password)
}

pub fn validate_title(title: &str) -> Result<&str, ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    Ok(title)
}

pub fn validate_price(price: f64) -> Result<f64, ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::validation(format!(
            "Invalid price: {}. Price must be a non-negative number",
            price
        )));
    }
    Ok(price)
}

/// Validate nested relation names (tags/ingredients); blank names are
/// rejected before any row is written.
pub fn validate_label_names(names: &[String]) -> Result<(), ApiError> {
    for name in names {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Name cannot be blank"));
        }
    }
    Ok(())
}

pub fn validate_label_name(name: &str) -> Result<&str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Name cannot be blank"));
    }
    Ok(name)
}

/// Parse a comma-separated id list query param (`tags=1,2,3`).
pub fn parse_id_list(raw: &str) -> Result<Vec<i32>, ApiError> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<i32>()
                .map_err(|_| ApiError::validation(format!("Invalid id in list: {}", s.trim())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("test1@EXAMPLE.com").unwrap(),
            "test1@example.com"
        );
        assert_eq!(
            normalize_email("Test2@Example.com").unwrap(),
            "Test2@example.com"
        );
        assert_eq!(
            normalize_email("TEST3@EXAMPLE.COM").unwrap(),
            "TEST3@example.com"
        );
        assert!(normalize_email("").is_err());
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("user@").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_ok());
        assert!(validate_password("1234").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(5.25).is_ok());
        assert!(validate_price(-1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("7").unwrap(), vec![7]);
        assert_eq!(parse_id_list("1, 2").unwrap(), vec![1, 2]);
        assert!(parse_id_list("").unwrap().is_empty());
        assert!(parse_id_list("1,abc").is_err());
    }

    #[test]
    fn test_validate_label_names() {
        assert!(validate_label_names(&["Vegan".to_string()]).is_ok());
        assert!(validate_label_names(&[]).is_ok());
        assert!(validate_label_names(&["  ".to_string()]).is_err());
    }
}
