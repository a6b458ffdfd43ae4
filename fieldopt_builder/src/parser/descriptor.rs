use crate::api::{AnonymousBinding, Hook};
use crate::model::{Kind, TypeHint};
use crate::parser::{display_line, Nest, ParseError};

/// The compiled form of one field, as seen by callbacks and the usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    pub(crate) kind: Kind,
    pub(crate) hint: TypeHint,
    pub(crate) help: Option<String>,
    pub(crate) required: bool,
    pub(crate) choices: Vec<String>,
    pub(crate) default_display: Option<String>,
    pub(crate) truncate: bool,
}

impl OptionDescriptor {
    #[cfg(test)]
    pub(crate) fn scratch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short: None,
            kind: Kind::Flag,
            hint: TypeHint::Str,
            help: None,
            required: false,
            choices: Vec::default(),
            default_display: None,
            truncate: false,
        }
    }

    /// The long name (ex: `log-level` for `--log-level`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The short name, if any.
    pub fn short(&self) -> Option<char> {
        self.short
    }

    /// The role on the command line.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The semantic value type.
    pub fn type_hint(&self) -> TypeHint {
        self.hint
    }

    /// The documentation.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Whether validation reports the field when it is still unset after parsing.
    pub fn required(&self) -> bool {
        self.required
    }

    /// The accepted values, sorted; empty when any value is accepted.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// The default shown in the usage.
    pub fn default_display(&self) -> Option<&str> {
        self.default_display.as_deref()
    }

    /// Whether integers which do not fit the field are narrowed instead of rejected.
    pub fn truncate(&self) -> bool {
        self.truncate
    }

    /// The usage line of this descriptor.
    ///
    /// ### Example
    /// ```text
    ///     -a  UINT --age UINT          field with type hint
    /// ```
    pub fn display(&self) -> String {
        display_line(self)
    }

    pub(crate) fn label(&self) -> String {
        match self.kind {
            Kind::Argument => self.name.to_uppercase(),
            _ => format!("--{}", self.name),
        }
    }
}

impl std::fmt::Display for OptionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

pub(crate) enum Target<R> {
    Value(Box<dyn AnonymousBinding<R>>),
    Subcommand(Nest<R>),
}

pub(crate) enum Trigger<R> {
    Callback(Hook<R>),
    Help,
}

impl<R> std::fmt::Debug for Trigger<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Callback(_) => write!(f, "Callback"),
            Trigger::Help => write!(f, "Help"),
        }
    }
}

/// A descriptor bound to the record `R`.
pub(crate) struct Slot<R> {
    pub(crate) descriptor: OptionDescriptor,
    pub(crate) target: Target<R>,
    pub(crate) trigger: Option<Trigger<R>>,
    pub(crate) default: Option<String>,
}

impl<R> Slot<R> {
    /// Check the choices, then coerce the token into the field.
    /// Nothing is written on error.
    pub(crate) fn set(&self, record: &mut R, token: &str) -> Result<(), ParseError> {
        let descriptor = &self.descriptor;

        if !descriptor.choices.is_empty()
            && descriptor
                .choices
                .binary_search_by(|choice| choice.as_str().cmp(token))
                .is_err()
        {
            return Err(ParseError::NotAChoice {
                name: descriptor.name.clone(),
                token: token.to_string(),
                choices: descriptor.choices.clone(),
            });
        }

        match &self.target {
            Target::Value(binding) => binding
                .assign(record, token, descriptor.truncate)
                .map_err(|error| ParseError::Invalid {
                    name: descriptor.name.clone(),
                    source: error,
                }),
            Target::Subcommand(_) => {
                unreachable!("internal error - a sub-command cannot be set from a token");
            }
        }
    }

    pub(crate) fn flip(&self, record: &mut R) -> Result<(), ParseError> {
        match &self.target {
            Target::Value(binding) => {
                binding
                    .flip(record)
                    .map_err(|error| ParseError::Invalid {
                        name: self.descriptor.name.clone(),
                        source: error,
                    })
            }
            Target::Subcommand(_) => {
                unreachable!("internal error - a sub-command cannot be flipped");
            }
        }
    }

    pub(crate) fn is_unset(&self, record: &mut R) -> bool {
        match &self.target {
            Target::Value(binding) => binding.is_unset(record),
            Target::Subcommand(_) => false,
        }
    }
}
