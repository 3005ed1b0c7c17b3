//! Result type alias for the EMR gateway

use super::errors::EmrError;

/// Result type alias for gateway operations
///
/// # Examples
///
/// ```
/// use emr_gateway::domain::result::Result;
/// use emr_gateway::domain::errors::EmrError;
///
/// fn lookup() -> Result<()> {
///     Err(EmrError::RegistryMiss("st-marys".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, EmrError>;
