use std::env;
use std::fmt::Display;
use std::io;

use tracing::Dispatch;

use crate::api::Command;
use crate::parser::{
    terminal_width, BuildError, ConsoleInterface, ParseError, RequiredError, Schema, Selection,
    UserInterface,
};

/// The command line parser of the record `R`.
///
/// Holds the record for its whole lifetime; drop the parser to read the parsed values.
pub struct CommandLineParser<'a, R> {
    record: &'a mut R,
    schema: Schema<R>,
    user_interface: Box<dyn UserInterface>,
    dispatch: Option<Dispatch>,
    selection: Selection,
}

impl<'a, R: Command> CommandLineParser<'a, R> {
    /// Compile the schema of `R`, then apply its defaults to `record`.
    ///
    /// The values present in `record` afterwards are shown as the defaults in the usage.
    pub fn try_new(record: &'a mut R) -> Result<Self, BuildError> {
        Self::assemble(record, None)
    }

    /// Same as [`CommandLineParser::try_new`], with the diagnostics of compiling and parsing sent to `dispatch`.
    ///
    /// ### Example
    /// ```
    /// # use fieldopt_builder as fieldopt;
    /// use fieldopt::{Command, CommandLineParser, Fields, Meta};
    /// use tracing::Dispatch;
    ///
    /// #[derive(Default)]
    /// struct Args {
    ///     verbose: bool,
    /// }
    ///
    /// impl Command for Args {
    ///     fn name() -> String {
    ///         "args".to_string()
    ///     }
    ///
    ///     fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
    ///         fields.field("verbose", |a: &mut Args| &mut a.verbose, Meta::new());
    ///     }
    /// }
    ///
    /// let mut args = Args::default();
    /// let mut parser = CommandLineParser::with_dispatch(&mut args, Dispatch::none()).unwrap();
    /// parser.parse(&["--verbose"]).unwrap();
    /// ```
    pub fn with_dispatch(record: &'a mut R, dispatch: Dispatch) -> Result<Self, BuildError> {
        Self::assemble(record, Some(dispatch))
    }

    /// Same as [`CommandLineParser::try_new`], exiting with code `1` (via [`std::process::exit`]) when `R` is mis-declared.
    pub fn new(record: &'a mut R) -> Self {
        match Self::try_new(record) {
            Ok(parser) => parser,
            Err(error) => {
                eprintln!("error: {error}");
                std::process::exit(1);
            }
        }
    }

    fn assemble(record: &'a mut R, dispatch: Option<Dispatch>) -> Result<Self, BuildError> {
        let schema = scoped(dispatch.as_ref(), || Schema::compile(record))?;

        Ok(Self {
            record,
            schema,
            user_interface: Box::new(ConsoleInterface::default()),
            dispatch,
            selection: Selection::default(),
        })
    }

    /// Override the name shown in the usage.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.schema.name = name.into();
        self
    }

    /// Override where the usage and the errors are shown.
    pub fn interface(mut self, user_interface: Box<dyn UserInterface>) -> Self {
        self.user_interface = user_interface;
        self
    }

    /// The compiled schema.
    pub fn schema(&self) -> &Schema<R> {
        &self.schema
    }

    /// The sub-commands selected by the latest [`CommandLineParser::parse`].
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Parse `tokens` into the record; see [`Schema::parse`].
    ///
    /// Nothing is printed: a help request is returned as [`ParseError::Help`].
    /// Required fields are not checked; see [`CommandLineParser::validate`].
    pub fn parse(&mut self, tokens: &[&str]) -> Result<(), ParseError> {
        let selection = scoped(self.dispatch.as_ref(), || {
            self.schema.parse(self.record, tokens)
        })?;
        self.selection = selection;
        Ok(())
    }

    /// Report every required field still unset after the latest [`CommandLineParser::parse`].
    pub fn validate(&mut self) -> Result<(), RequiredError> {
        self.schema.validate(self.record, &self.selection)
    }

    /// Parse then validate `tokens`, showing the outcome on the user interface.
    ///
    /// On success returns `Ok(())`.
    /// On a help request the usage is shown and returns `Err(0)`.
    /// When a callback asks to exit, returns `Err(code)`.
    /// On any other error, the error and the usage are shown and returns `Err(1)`.
    pub fn parse_tokens(&mut self, tokens: &[&str]) -> Result<(), i32> {
        match self.parse(tokens) {
            Ok(()) => {}
            Err(ParseError::Help(usage)) => {
                self.user_interface.print(usage);
                return Err(0);
            }
            Err(ParseError::Exit(code)) => return Err(code),
            Err(error) => {
                let usage =
                    self.schema
                        .scoped_usage(&self.schema.name, &error.scope(), terminal_width());
                self.user_interface
                    .print_error(format!("error: {error}\n{usage}"));
                return Err(1);
            }
        }

        if let Err(error) = self.validate() {
            let usage = self.usage();
            self.user_interface
                .print_error(format!("error: {error}\n{usage}"));
            return Err(1);
        }

        Ok(())
    }

    /// Run [`CommandLineParser::parse_tokens`] against the process arguments ([`env::args`]).
    ///
    /// Exits the process (via [`std::process::exit`]) with the code of any `Err`.
    pub fn run(mut self) {
        let command_input: Vec<String> = env::args().skip(1).collect();

        if let Err(exit_code) = self.parse_tokens(
            command_input
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<&str>>()
                .as_slice(),
        ) {
            std::process::exit(exit_code);
        }
    }

    /// The usage text, wrapped to the terminal.
    pub fn usage(&self) -> String {
        self.schema.usage_text(&self.schema.name, terminal_width())
    }

    /// Write the usage to `writer`, preceded by `error: ..` when there is an error.
    pub fn write_usage(
        &self,
        writer: &mut impl io::Write,
        error: Option<&dyn Display>,
    ) -> io::Result<()> {
        if let Some(error) = error {
            writeln!(writer, "error: {error}")?;
        }

        writeln!(writer, "{}", self.usage())
    }
}

fn scoped<T>(dispatch: Option<&Dispatch>, f: impl FnOnce() -> T) -> T {
    match dispatch {
        Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
        None => f(),
    }
}
