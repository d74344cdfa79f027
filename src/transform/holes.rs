use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One drilled feature on a part
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleDescriptor {
    pub length: f64,
    pub radius: f64,
}

#[derive(Error, Debug)]
pub enum HoleDecodeError {
    /// The cell is not a JSON list of objects carrying numeric `length` and `radius`
    #[error("malformed hole list: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode the `holes` cell of one record.
///
/// A null cell means no holes were recorded and decodes to `None`. Anything
/// else must be a JSON list of hole objects; extra attributes on a hole are
/// ignored, a missing or non-numeric `length`/`radius` is an error.
pub fn decode_holes(cell: Option<&str>) -> Result<Option<Vec<HoleDescriptor>>, HoleDecodeError> {
    match cell {
        None => Ok(None),
        Some(text) => Ok(Some(serde_json::from_str(text)?)),
    }
}
