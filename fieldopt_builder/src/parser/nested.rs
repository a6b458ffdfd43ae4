use tracing::debug;

use crate::api::{Command, Lens};
use crate::parser::{BuildError, ParseError, Schema, Selection};

/// A sub-command: the schema of a child record, reached from the parent record `P`.
///
/// Created by the code `#[derive(Command)]` emits; not meant to be used directly.
#[doc(hidden)]
pub struct Nest<P> {
    inner: Box<dyn Nested<P>>,
}

impl<P: 'static> Nest<P> {
    /// A child record held directly in the parent.
    pub fn direct<C: Command>(lens: Lens<P, C>) -> Result<Self, BuildError> {
        Ok(Self {
            inner: Box::new(NestedRecord {
                cell: RecordCell::Direct(lens),
                schema: Schema::<C>::build()?,
            }),
        })
    }

    /// A child record held in an `Option`, created when the sub-command is selected.
    pub fn optional<C: Command>(lens: Lens<P, Option<C>>) -> Result<Self, BuildError> {
        Ok(Self {
            inner: Box::new(NestedRecord {
                cell: RecordCell::Optional(lens),
                schema: Schema::<C>::build()?,
            }),
        })
    }

    pub(crate) fn apply_defaults(&self, parent: &mut P) -> Result<(), BuildError> {
        self.inner.apply_defaults(parent)
    }

    pub(crate) fn capture_displays(&mut self, parent: &mut P) {
        self.inner.capture_displays(parent)
    }

    pub(crate) fn dispatch(
        &self,
        parent: &mut P,
        tokens: &[&str],
        program: &str,
    ) -> Result<Selection, ParseError> {
        self.inner.dispatch(parent, tokens, program)
    }

    pub(crate) fn missing(
        &self,
        parent: &mut P,
        path: &[String],
        prefix: &str,
        out: &mut Vec<String>,
    ) {
        self.inner.missing(parent, path, prefix, out)
    }

    pub(crate) fn usage(
        &self,
        program: &str,
        path: &[String],
        terminal_width: Option<usize>,
    ) -> String {
        self.inner.usage(program, path, terminal_width)
    }
}

trait Nested<P> {
    fn apply_defaults(&self, parent: &mut P) -> Result<(), BuildError>;

    fn capture_displays(&mut self, parent: &mut P);

    fn dispatch(&self, parent: &mut P, tokens: &[&str], program: &str)
        -> Result<Selection, ParseError>;

    fn missing(&self, parent: &mut P, path: &[String], prefix: &str, out: &mut Vec<String>);

    fn usage(&self, program: &str, path: &[String], terminal_width: Option<usize>) -> String;
}

enum RecordCell<P, C> {
    Direct(Lens<P, C>),
    Optional(Lens<P, Option<C>>),
}

impl<P, C: Default> RecordCell<P, C> {
    /// The child record, if it exists.
    fn peek<'r>(&self, parent: &'r mut P) -> Option<&'r mut C> {
        match self {
            RecordCell::Direct(lens) => Some(lens(parent)),
            RecordCell::Optional(lens) => lens(parent).as_mut(),
        }
    }

    /// The child record, created with `C::default()` if needed.
    /// The flag tells whether it was just created.
    fn get_or_insert_default<'r>(&self, parent: &'r mut P) -> (&'r mut C, bool) {
        match self {
            RecordCell::Direct(lens) => (lens(parent), false),
            RecordCell::Optional(lens) => {
                let cell = lens(parent);
                let fresh = cell.is_none();
                (cell.get_or_insert_with(C::default), fresh)
            }
        }
    }
}

struct NestedRecord<P, C> {
    cell: RecordCell<P, C>,
    schema: Schema<C>,
}

impl<P, C: Command> Nested<P> for NestedRecord<P, C> {
    fn apply_defaults(&self, parent: &mut P) -> Result<(), BuildError> {
        match self.cell.peek(parent) {
            Some(child) => self.schema.apply_defaults(child),
            None => Ok(()),
        }
    }

    fn capture_displays(&mut self, parent: &mut P) {
        if let Some(child) = self.cell.peek(parent) {
            self.schema.capture_displays(child);
        }
    }

    fn dispatch(
        &self,
        parent: &mut P,
        tokens: &[&str],
        program: &str,
    ) -> Result<Selection, ParseError> {
        let (child, fresh) = self.cell.get_or_insert_default(parent);

        if fresh {
            debug!("Created the record of the sub-command '{program}'.");
            self.schema
                .apply_defaults(child)
                .map_err(|error| ParseError::Default { source: error })?;
        }

        self.schema.dispatch(child, tokens, program)
    }

    fn missing(&self, parent: &mut P, path: &[String], prefix: &str, out: &mut Vec<String>) {
        if let Some(child) = self.cell.peek(parent) {
            self.schema.missing(child, path, prefix, out);
        }
    }

    fn usage(&self, program: &str, path: &[String], terminal_width: Option<usize>) -> String {
        self.schema.scoped_usage(program, path, terminal_width)
    }
}
