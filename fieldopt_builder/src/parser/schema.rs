use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, trace};

use crate::api::{CallbackRef, Capture, Command, FieldSpec, Fields, Hook, Shape};
use crate::constant::HELP_CALLBACK;
use crate::model::Kind;
use crate::parser::{OptionDescriptor, Slot, Target, Trigger};

/// Failure to compile a record into its schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// Two fields share a long name, a short name or a sub-command name.
    #[error("duplicated option name: {name}.")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },
    /// The field cannot take part in the command line.
    #[error("unsupported field '{name}': {reason}.")]
    Unsupported {
        /// The field.
        name: String,
        /// Why it is rejected.
        reason: String,
    },
    /// The named callback is neither registered on the record nor built-in.
    #[error("cannot find callback '{callback}' for '{name}'.")]
    UnknownCallback {
        /// The field.
        name: String,
        /// The requested callback.
        callback: String,
    },
    /// An option flag other than `flag`, `skip`, `trunc` or `required`.
    #[error("unknown option flag '{flag}'.")]
    UnknownFlag {
        /// The offending flag.
        flag: String,
    },
    /// A short name which is not exactly one character.
    #[error("short name '{short}' must be a single character.")]
    InvalidShort {
        /// The offending short name.
        short: String,
    },
    /// The default is not accepted by the field.
    #[error("invalid default for '{name}': {reason}")]
    InvalidDefault {
        /// The field.
        name: String,
        /// Why the default is rejected.
        reason: String,
    },
    /// The record of a sub-command failed to compile.
    #[error("sub-command '{name}': {source}")]
    Subcommand {
        /// The sub-command.
        name: String,
        /// The failure within the sub-command.
        source: Box<BuildError>,
    },
    /// The name of the field resolves to the empty string.
    #[error("empty option name.")]
    EmptyName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    Flag(usize),
    Positional(usize),
    Subcommand(usize),
}

/// The compiled command line of the record `R`.
///
/// Holds the descriptors bound into `R`, never the record itself.
/// Usually used via [`crate::CommandLineParser`].
pub struct Schema<R> {
    pub(crate) name: String,
    pub(crate) help: Option<String>,
    pub(crate) flags: Vec<Slot<R>>,
    pub(crate) positionals: Vec<Slot<R>>,
    pub(crate) subcommands: Vec<Slot<R>>,
    pub(crate) index: HashMap<String, Position>,
}

impl<R> std::fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("descriptors", &self.descriptors().collect::<Vec<_>>())
            .finish()
    }
}

impl<R> Schema<R> {
    /// The name shown in the usage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every descriptor: flags, then positionals, then sub-commands.
    pub fn descriptors(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.flags
            .iter()
            .chain(self.positionals.iter())
            .chain(self.subcommands.iter())
            .map(|slot| &slot.descriptor)
    }
}

impl<R: Command> Schema<R> {
    /// Build the schema of `R`, without touching any record.
    ///
    /// Every default is checked against a fresh `R::default()`.
    pub fn build() -> Result<Self, BuildError> {
        let mut fields = Fields::<R, R>::root();
        R::declare(&mut fields);
        let Fields {
            specs,
            registry,
            deferred_error,
            ..
        } = fields;

        if let Some(error) = deferred_error {
            return Err(error);
        }

        let mut schema = Self {
            name: R::name(),
            help: R::help(),
            flags: Vec::default(),
            positionals: Vec::default(),
            subcommands: Vec::default(),
            index: HashMap::default(),
        };

        for spec in specs {
            schema.add(spec, &registry)?;
        }

        let mut scratch = R::default();
        schema.apply_defaults(&mut scratch)?;
        debug!(
            "Built schema '{}' with {} flags, {} positionals and {} sub-commands.",
            schema.name,
            schema.flags.len(),
            schema.positionals.len(),
            schema.subcommands.len()
        );
        Ok(schema)
    }

    /// Build the schema of `R`, then apply its defaults to `record`.
    ///
    /// The values present in `record` afterwards are shown as the defaults in the usage.
    pub fn compile(record: &mut R) -> Result<Self, BuildError> {
        let mut schema = Self::build()?;
        schema.apply_defaults(record)?;
        schema.capture_displays(record);
        Ok(schema)
    }

    fn add(
        &mut self,
        spec: FieldSpec<R>,
        registry: &HashMap<String, Hook<R>>,
    ) -> Result<(), BuildError> {
        let FieldSpec {
            name,
            short,
            help,
            callback,
            choice,
            default,
            flags,
            shape,
            indirect,
            capture,
        } = spec;

        if name.is_empty() {
            return Err(BuildError::EmptyName);
        }

        let kind = classify(&name, flags.flag, shape, indirect)?;
        let trigger = match callback {
            None => None,
            Some(CallbackRef::Bound(hook)) => Some(Trigger::Callback(hook)),
            Some(CallbackRef::Named(callback)) => match registry.get(&callback) {
                Some(hook) => Some(Trigger::Callback(hook.clone())),
                None if callback == HELP_CALLBACK => Some(Trigger::Help),
                None => return Err(BuildError::UnknownCallback { name, callback }),
            },
        };
        let short = match (kind, short) {
            (Kind::Flip | Kind::Flag, short) => short,
            (_, Some(short)) => {
                debug!("Ignoring the short name '{short}' of the {kind} '{name}'.");
                None
            }
            (_, None) => None,
        };
        let mut choices: Vec<String> = choice
            .map(|choice| choice.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        choices.sort();
        choices.dedup();

        let default = match (kind, default) {
            (Kind::Subcommand, Some(default)) => {
                debug!("Ignoring the default '{default}' of the sub-command '{name}'.");
                None
            }
            (_, default) => default,
        };
        let required = match kind {
            Kind::Argument => true,
            Kind::Flip | Kind::Flag => flags.required,
            Kind::Subcommand | Kind::Ignore => false,
        };
        let target = match capture {
            Capture::Value(binding) => Target::Value(binding),
            Capture::Record(nest) => Target::Subcommand(nest),
        };
        let descriptor = OptionDescriptor {
            name,
            short,
            kind,
            hint: shape.hint(),
            help,
            required,
            choices,
            default_display: default.clone(),
            truncate: flags.trunc,
        };
        let position = match kind {
            Kind::Flip | Kind::Flag => Position::Flag(self.flags.len()),
            Kind::Argument => Position::Positional(self.positionals.len()),
            Kind::Subcommand => Position::Subcommand(self.subcommands.len()),
            Kind::Ignore => {
                return Err(BuildError::Unsupported {
                    name: descriptor.name,
                    reason: "an ignored field cannot be placed".to_string(),
                });
            }
        };

        self.register(descriptor.name.clone(), position)?;

        if let Some(short) = descriptor.short {
            self.register(short.to_string(), position)?;
        }

        trace!(
            "Compiled '{}' as {} ({}).",
            descriptor.name,
            descriptor.kind,
            descriptor.hint
        );
        let slot = Slot {
            descriptor,
            target,
            trigger,
            default,
        };

        match position {
            Position::Flag(_) => self.flags.push(slot),
            Position::Positional(_) => self.positionals.push(slot),
            Position::Subcommand(_) => self.subcommands.push(slot),
        };

        Ok(())
    }

    fn register(&mut self, key: String, position: Position) -> Result<(), BuildError> {
        if self.index.contains_key(&key) {
            return Err(BuildError::DuplicateName { name: key });
        }

        self.index.insert(key, position);
        Ok(())
    }

    /// Apply every default to `record` through the set path, without invoking any callback.
    pub(crate) fn apply_defaults(&self, record: &mut R) -> Result<(), BuildError> {
        for slot in self.flags.iter().chain(self.positionals.iter()) {
            if let Some(default) = &slot.default {
                trace!("Applying default '{default}' to '{}'.", slot.descriptor.name);
                slot.set(record, default)
                    .map_err(|error| BuildError::InvalidDefault {
                        name: slot.descriptor.name.clone(),
                        reason: error.to_string(),
                    })?;
            }
        }

        for slot in &self.subcommands {
            if let Target::Subcommand(nest) = &slot.target {
                nest.apply_defaults(record)?;
            }
        }

        Ok(())
    }

    pub(crate) fn capture_displays(&mut self, record: &mut R) {
        for slot in self.flags.iter_mut().chain(self.positionals.iter_mut()) {
            if slot.descriptor.default_display.is_none() {
                if let Target::Value(binding) = &slot.target {
                    if !binding.is_unset(record) {
                        slot.descriptor.default_display = binding.display(record);
                    }
                }
            }
        }

        for slot in self.subcommands.iter_mut() {
            if let Target::Subcommand(nest) = &mut slot.target {
                nest.capture_displays(record);
            }
        }
    }
}

fn classify(name: &str, forced_flag: bool, shape: Shape, indirect: bool) -> Result<Kind, BuildError> {
    match shape {
        Shape::Record if forced_flag => Err(BuildError::Unsupported {
            name: name.to_string(),
            reason: "a sub-command cannot be forced into a flag".to_string(),
        }),
        _ if forced_flag => Ok(Kind::Flag),
        Shape::Boolean => Ok(Kind::Flip),
        Shape::Record => Ok(Kind::Subcommand),
        Shape::Scalar(_) if indirect => Ok(Kind::Argument),
        Shape::Scalar(_) => Ok(Kind::Flag),
    }
}
