use validator::Validate;

use crate::error::Result;

/// Run derive-based validation and surface failures through the crate
/// error taxonomy with the offending field names attached.
pub fn validate<T: Validate>(value: &T) -> Result<()> {
    value.validate()?;
    Ok(())
}
