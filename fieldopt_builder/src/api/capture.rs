use crate::api::{Bindable, Lens};
use crate::coerce::CoerceError;

/// Behaviour to write into one field of the record `R`, without exposing the field's type.
///
/// We use this at the bottom of the schema so the descriptors stay free of each field's type `T`.
pub(crate) trait AnonymousBinding<R> {
    /// Coerce the token and write it into the field.
    /// The field is left untouched on error.
    fn assign(&self, record: &mut R, token: &str, truncate: bool) -> Result<(), CoerceError>;

    /// Toggle the field.
    fn flip(&self, record: &mut R) -> Result<(), CoerceError>;

    /// Whether the field still holds its zero value.
    fn is_unset(&self, record: &mut R) -> bool;

    /// The current value, as shown in the usage.
    fn display(&self, record: &mut R) -> Option<String>;
}

pub(crate) struct Binding<R, T> {
    lens: Lens<R, T>,
}

impl<R, T> Binding<R, T> {
    pub(crate) fn new(lens: Lens<R, T>) -> Self {
        Self { lens }
    }
}

impl<R, T: Bindable> AnonymousBinding<R> for Binding<R, T> {
    fn assign(&self, record: &mut R, token: &str, truncate: bool) -> Result<(), CoerceError> {
        let value = T::coerce(token, truncate)?;
        *(self.lens)(record) = value;
        Ok(())
    }

    fn flip(&self, record: &mut R) -> Result<(), CoerceError> {
        (self.lens)(record).flip()
    }

    fn is_unset(&self, record: &mut R) -> bool {
        (self.lens)(record).is_unset()
    }

    fn display(&self, record: &mut R) -> Option<String> {
        (self.lens)(record).display()
    }
}
