//! Assembly-time validation.

use crate::domain::ReaderError;

/// Validate checks that a component has every mandatory collaborator and
/// property before it is handed to orchestration.
///
/// Takes `&self`: a successful check cannot change what the component does next.
pub trait Validate {
    fn validate(&self) -> Result<(), ReaderError>;
}
