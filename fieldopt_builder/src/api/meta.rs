use std::rc::Rc;

use tracing::debug;

use crate::api::CallbackError;
use crate::parser::{BuildError, OptionDescriptor};

const IGNORE_MARKER: &str = "-";

/// The behaviour flags accepted by [`Meta::option`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OptionFlags {
    pub(crate) flag: bool,
    pub(crate) skip: bool,
    pub(crate) trunc: bool,
    pub(crate) required: bool,
}

impl OptionFlags {
    fn enable(&mut self, flag: &str) -> Result<(), BuildError> {
        match flag {
            "flag" => self.flag = true,
            "skip" => self.skip = true,
            "trunc" => self.trunc = true,
            "required" => self.required = true,
            _ => {
                return Err(BuildError::UnknownFlag {
                    flag: flag.to_string(),
                })
            }
        };

        Ok(())
    }
}

pub(crate) type RecordCallback<S> =
    Rc<dyn Fn(&mut S, &OptionDescriptor) -> Result<(), CallbackError>>;

pub(crate) enum CallbackSource<S> {
    Named(String),
    Bound(RecordCallback<S>),
}

impl<S> std::fmt::Debug for CallbackSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackSource::Named(name) => f.debug_tuple("Named").field(name).finish(),
            CallbackSource::Bound(_) => write!(f, "Bound"),
        }
    }
}

/// The metadata of one field of the record `S`.
///
/// ### Example
/// ```
/// # use fieldopt_builder as fieldopt;
/// use fieldopt::Meta;
///
/// #[derive(Default)]
/// struct Args {
///     level: String,
/// }
///
/// let meta: Meta<Args> = Meta::new()
///     .short('l')
///     .help("the log level")
///     .choice("warn info debug")
///     .default("info");
/// ```
pub struct Meta<S> {
    pub(crate) ignore: bool,
    pub(crate) name: Option<String>,
    pub(crate) short: Option<char>,
    pub(crate) help: Option<String>,
    pub(crate) callback: Option<CallbackSource<S>>,
    pub(crate) choice: Option<String>,
    pub(crate) default: Option<String>,
    pub(crate) flags: OptionFlags,
    pub(crate) deferred_error: Option<BuildError>,
}

impl<S> Default for Meta<S> {
    fn default() -> Self {
        Self {
            ignore: false,
            name: None,
            short: None,
            help: None,
            callback: None,
            choice: None,
            default: None,
            flags: OptionFlags::default(),
            deferred_error: None,
        }
    }
}

impl<S> Meta<S> {
    /// Create empty metadata; the field is exposed under its own name.
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Exclude the field from the command line.
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Override the long name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name.replace(name.into());
        self
    }

    /// Set the short name (ex: `'v'` for `-v`).
    pub fn short(mut self, short: char) -> Self {
        self.short.replace(short);
        self
    }

    /// Document the field.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help.replace(help.into());
        self
    }

    /// Invoke a named callback after every successful set.
    /// The name is resolved when the schema is built: first amongst the record's registered callbacks, then the built-in `help`.
    pub fn callback(mut self, name: impl Into<String>) -> Self {
        self.callback.replace(CallbackSource::Named(name.into()));
        self
    }

    /// Invoke `callback` after every successful set.
    pub fn callback_fn(
        mut self,
        callback: impl Fn(&mut S, &OptionDescriptor) -> Result<(), CallbackError> + 'static,
    ) -> Self {
        self.callback
            .replace(CallbackSource::Bound(Rc::new(callback)));
        self
    }

    /// Restrict the accepted values to this whitespace separated list.
    pub fn choice(mut self, choices: impl Into<String>) -> Self {
        self.choice.replace(choices.into());
        self
    }

    /// Apply this value when the schema is compiled, and show it in the usage.
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default.replace(value.into());
        self
    }

    /// Enable behaviour flags from a comma separated list of `flag`, `skip`, `trunc` and `required`.
    ///
    /// An unknown flag is reported when the schema is built.
    pub fn option(mut self, flags: &str) -> Self {
        for flag in flags.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if let Err(error) = self.flags.enable(flag) {
                self.defer(error);
            }
        }

        self
    }

    /// Apply a textual tag such as `short:"v" help:"verbose output"`.
    ///
    /// A bare `-` excludes the field.
    /// Unrecognized keys are skipped.
    ///
    /// ### Example
    /// ```
    /// # use fieldopt_builder as fieldopt;
    /// use fieldopt::Meta;
    ///
    /// struct Args;
    ///
    /// let meta: Meta<Args> = Meta::new().tag(r#"short:"n" name:"count" option:"trunc""#);
    /// ```
    pub fn tag(mut self, tag: &str) -> Self {
        for (key, value) in separate_tags(tag) {
            if key == IGNORE_MARKER {
                self.ignore = true;
                continue;
            }

            if value.is_empty() {
                debug!("Skipping empty tag '{key}'.");
                continue;
            }

            self = match key.as_str() {
                "name" => self.name(value),
                "short" => {
                    let mut chars = value.chars();
                    match (chars.next(), chars.next()) {
                        (Some(short), None) => self.short(short),
                        _ => {
                            self.defer(BuildError::InvalidShort { short: value });
                            self
                        }
                    }
                }
                "help" => self.help(value),
                "callback" => self.callback(value),
                "choice" => self.choice(value),
                "default" => self.default(value),
                "option" => self.option(&value),
                _ => {
                    debug!("Skipping unrecognized tag '{key}'.");
                    self
                }
            };
        }

        self
    }

    fn defer(&mut self, error: BuildError) {
        if self.deferred_error.is_none() {
            self.deferred_error.replace(error);
        }
    }
}

// Splits `key:"value" key2:"value 2" key3` into its key/value pairs, in order.
fn separate_tags(tag: &str) -> Vec<(String, String)> {
    let mut tags = Vec::default();
    let mut chars = tag.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        if chars.peek().is_none() {
            break;
        }

        let mut key = String::default();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != ':') {
            key.push(c);
        }

        let mut value = String::default();
        if chars.next_if_eq(&':').is_some() {
            if chars.next_if_eq(&'"').is_some() {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => value.push(c),
                    }
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
            }
        }

        if !key.is_empty() {
            tags.push((key, value));
        }
    }

    tags
}
