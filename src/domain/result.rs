//! Result type alias for deidb

use super::errors::DeidbError;

/// Result type alias for deidb operations
///
/// # Examples
///
/// ```
/// use deidb::domain::result::Result;
/// use deidb::domain::errors::DeidbError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DeidbError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DeidbError>;
