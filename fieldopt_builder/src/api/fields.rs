use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::api::meta::{CallbackSource, OptionFlags};
use crate::api::{compose, lens, AnonymousBinding, Bindable, Binding, Lens, Meta, Shape};
use crate::parser::{BuildError, CommandLineParser, Nest, OptionDescriptor};

/// Failure raised from within a callback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback rejected the value.
    #[error("{0}")]
    Failed(String),
    /// The callback asks the program to stop with this exit code (ex: after printing a version).
    #[error("exit requested with code {0}.")]
    Exit(i32),
}

/// A record which declares its command line.
///
/// Usually implemented via `#[derive(Command)]`; the implementation may also be written by hand.
///
/// ### Example
/// ```
/// # use fieldopt_builder as fieldopt;
/// use fieldopt::{Command, CommandLineParser, Fields, Meta};
///
/// #[derive(Default)]
/// struct Args {
///     verbose: bool,
///     count: u32,
/// }
///
/// impl Command for Args {
///     fn name() -> String {
///         "args".to_string()
///     }
///
///     fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
///         fields.field("verbose", |a: &mut Args| &mut a.verbose, Meta::new().short('v'));
///         fields.field("count", |a: &mut Args| &mut a.count, Meta::new().default("3"));
///     }
/// }
///
/// let mut args = Args::default();
/// let mut parser = CommandLineParser::try_new(&mut args).unwrap();
/// parser.parse(&["-v", "--count", "0x10"]).unwrap();
/// drop(parser);
///
/// assert!(args.verbose);
/// assert_eq!(args.count, 16);
/// ```
pub trait Command: Default + 'static {
    /// The name shown in the usage.
    fn name() -> String;

    /// The description shown in the usage.
    fn help() -> Option<String> {
        None
    }

    /// Declare every field, in order.
    fn declare<P: 'static>(fields: &mut Fields<P, Self>);

    /// Parse the process arguments into a new record.
    /// Exits the process on an error or a help request (via [`std::process::exit`]).
    fn parse_args() -> Self {
        let mut record = Self::default();
        CommandLineParser::new(&mut record).run();
        record
    }
}

pub(crate) type Hook<P> = Rc<dyn Fn(&mut P, &OptionDescriptor) -> Result<(), CallbackError>>;

pub(crate) enum CallbackRef<P> {
    Named(String),
    Bound(Hook<P>),
}

pub(crate) enum Capture<P> {
    Value(Box<dyn AnonymousBinding<P>>),
    Record(Nest<P>),
}

impl<P> std::fmt::Debug for Capture<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capture::Value(_) => write!(f, "Value"),
            Capture::Record(_) => write!(f, "Record"),
        }
    }
}

/// One declared field, lifted to the root record `P`.
pub(crate) struct FieldSpec<P> {
    pub(crate) name: String,
    pub(crate) short: Option<char>,
    pub(crate) help: Option<String>,
    pub(crate) callback: Option<CallbackRef<P>>,
    pub(crate) choice: Option<String>,
    pub(crate) default: Option<String>,
    pub(crate) flags: OptionFlags,
    pub(crate) shape: Shape,
    pub(crate) indirect: bool,
    pub(crate) capture: Capture<P>,
}

/// The field declarations of the record `S`, as seen from the record `P` being compiled.
///
/// `S` is `P` itself, or a record embedded in `P`.
pub struct Fields<P, S> {
    base: Lens<P, S>,
    inlined: bool,
    pub(crate) specs: Vec<FieldSpec<P>>,
    pub(crate) registry: HashMap<String, Hook<P>>,
    pub(crate) deferred_error: Option<BuildError>,
}

impl<P: 'static> Fields<P, P> {
    pub(crate) fn root() -> Self {
        Self::scoped(lens(|record: &mut P| record), false)
    }
}

impl<P: 'static, S: 'static> Fields<P, S> {
    fn scoped(base: Lens<P, S>, inlined: bool) -> Self {
        Self {
            base,
            inlined,
            specs: Vec::default(),
            registry: HashMap::default(),
            deferred_error: None,
        }
    }

    /// Declare the field `ident`, reached through `access`.
    ///
    /// Booleans become switches, records become sub-commands, `Option`s of values become positional arguments, and everything else becomes a flag.
    pub fn field<T: Bindable>(
        &mut self,
        ident: &str,
        access: impl Fn(&mut S) -> &mut T + 'static,
        meta: Meta<S>,
    ) {
        let Meta {
            ignore,
            name,
            short,
            help,
            callback,
            choice,
            default,
            flags,
            deferred_error,
        } = meta;

        if let Some(error) = deferred_error {
            self.defer(error);
            return;
        }

        if ignore || flags.skip {
            debug!("Skipping field '{ident}'.");
            return;
        }

        let name = name.unwrap_or_else(|| option_name(ident));
        let lens = compose(self.base.clone(), lens(access));
        let capture = match T::shape() {
            Shape::Record => match T::nest(lens) {
                Some(Ok(nest)) => Capture::Record(nest),
                Some(Err(error)) => {
                    self.defer(BuildError::Subcommand {
                        name,
                        source: Box::new(error),
                    });
                    return;
                }
                None => {
                    self.defer(BuildError::Unsupported {
                        name,
                        reason: "only a record or an optional record may be a sub-command"
                            .to_string(),
                    });
                    return;
                }
            },
            Shape::Boolean | Shape::Scalar(_) => Capture::Value(Box::new(Binding::new(lens))),
        };
        let callback = callback.map(|source| match source {
            CallbackSource::Named(name) => CallbackRef::Named(name),
            CallbackSource::Bound(callback) => CallbackRef::Bound(self.lift(callback)),
        });

        self.specs.push(FieldSpec {
            name,
            short,
            help,
            callback,
            choice,
            default,
            flags,
            shape: T::shape(),
            indirect: T::indirect(),
            capture,
        });
    }

    /// Declare the fields of the record `ident` in place of the record itself.
    ///
    /// Its fields and callbacks are promoted one level only: a record embedded within an embedded record is declared via [`Fields::field`], as a sub-command.
    pub fn embed<E: Command + Bindable>(
        &mut self,
        ident: &str,
        access: impl Fn(&mut S) -> &mut E + 'static,
        meta: Meta<S>,
    ) {
        if self.inlined {
            self.field(ident, access, meta);
            return;
        }

        if let Some(error) = meta.deferred_error {
            self.defer(error);
            return;
        }

        if meta.ignore || meta.flags.skip {
            debug!("Skipping embedded field '{ident}'.");
            return;
        }

        let mut inner = Fields::<P, E>::scoped(compose(self.base.clone(), lens(access)), true);
        E::declare(&mut inner);
        let Fields {
            specs,
            registry,
            deferred_error,
            ..
        } = inner;

        if let Some(error) = deferred_error {
            self.defer(error);
        }

        self.specs.extend(specs);

        for (name, hook) in registry {
            // The embedding record's own callbacks take precedence.
            self.registry.entry(name).or_insert(hook);
        }
    }

    /// Register a named callback, resolvable from [`Meta::callback`].
    pub fn register(
        &mut self,
        name: impl Into<String>,
        callback: impl Fn(&mut S, &OptionDescriptor) -> Result<(), CallbackError> + 'static,
    ) {
        let hook = self.lift(Rc::new(callback));
        self.registry.insert(name.into(), hook);
    }

    fn lift(
        &self,
        callback: Rc<dyn Fn(&mut S, &OptionDescriptor) -> Result<(), CallbackError>>,
    ) -> Hook<P> {
        let base = self.base.clone();
        Rc::new(move |record: &mut P, descriptor: &OptionDescriptor| {
            callback(base(record), descriptor)
        })
    }

    fn defer(&mut self, error: BuildError) {
        if self.deferred_error.is_none() {
            self.deferred_error = Some(error);
        }
    }
}

/// The long name of a field: lower-cased, with `_` as `-`.
pub(crate) fn option_name(ident: &str) -> String {
    ident
        .trim_start_matches("r#")
        .to_lowercase()
        .replace('_', "-")
}
