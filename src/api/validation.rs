use super::ApiError;
use crate::db::{SortDirection, UserSortField};

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if username.chars().count() < 6 {
        return Err(ApiError::validation(
            "Username must be at least 6 characters long",
        ));
    }

    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    if password.chars().count() < 6 {
        return Err(ApiError::validation(
            "Password must be at least 6 characters long",
        ));
    }

    Ok(password)
}

pub fn validate_name<'a>(name: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} cannot be empty")));
    }
    Ok(name)
}

pub fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page == 0 {
        return Err(ApiError::validation(
            "Invalid page: 0. Page must be a positive integer",
        ));
    }
    Ok(page)
}

pub fn validate_limit(limit: u64) -> Result<u64, ApiError> {
    const MAX_LIMIT: u64 = 1000;
    const MIN_LIMIT: u64 = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_LIMIT
        )));
    }
    Ok(limit)
}

/// Sort field comes from the caller; anything outside the allow-list is
/// rejected rather than interpolated into the query.
pub fn validate_sort_field(field: Option<&str>) -> Result<UserSortField, ApiError> {
    match field {
        None => Ok(UserSortField::CreatedAt),
        Some(s) => UserSortField::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown sort field: {s}"))),
    }
}

pub fn validate_sort_direction(direction: Option<&str>) -> Result<SortDirection, ApiError> {
    match direction {
        None => Ok(SortDirection::Desc),
        Some(s) => SortDirection::parse(s)
            .ok_or_else(|| ApiError::validation(format!("Unknown sort direction: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("validname").is_ok());
        assert!(validate_username("sixsix").is_ok());
        assert!(validate_username("abc").is_err());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("123").is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Ada", "firstName").is_ok());
        assert!(validate_name("", "firstName").is_err());
        assert!(validate_name("  ", "lastName").is_err());
    }

    #[test]
    fn test_validate_page_and_limit() {
        assert!(validate_page(1).is_ok());
        assert!(validate_page(0).is_err());
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(1000).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_sort_field_fails_closed() {
        assert_eq!(
            validate_sort_field(None).unwrap(),
            UserSortField::CreatedAt
        );
        assert_eq!(
            validate_sort_field(Some("username")).unwrap(),
            UserSortField::Username
        );
        assert!(validate_sort_field(Some("passwordHash")).is_err());
        assert!(validate_sort_field(Some("created_at; --")).is_err());
    }

    #[test]
    fn test_validate_sort_direction() {
        assert_eq!(
            validate_sort_direction(None).unwrap(),
            SortDirection::Desc
        );
        assert_eq!(
            validate_sort_direction(Some("asc")).unwrap(),
            SortDirection::Asc
        );
        assert!(validate_sort_direction(Some("upward")).is_err());
    }
}
