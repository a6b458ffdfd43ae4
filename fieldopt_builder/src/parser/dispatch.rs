use thiserror::Error;
use tracing::{debug, trace};

use crate::api::{CallbackError, Command};
use crate::coerce::CoerceError;
use crate::model::Kind;
use crate::parser::schema::Position;
use crate::parser::{terminal_width, BuildError, Schema, Slot, Target, Trigger};

/// The path of sub-commands selected while parsing, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(Vec<String>);

impl Selection {
    /// The names of the selected sub-commands.
    pub fn path(&self) -> &[String] {
        &self.0
    }

    fn descend(name: &str, selection: Selection) -> Self {
        let mut path = vec![name.to_string()];
        path.extend(selection.0);
        Selection(path)
    }
}

/// Failure to parse the command line.
///
/// The record may be partially updated: values set before the failure are kept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A `--name` or `-x` which matches no flag.
    #[error("unknown option '{option}'.")]
    UnknownOption {
        /// The offending token.
        option: String,
    },
    /// A value which matches neither a sub-command nor a free positional.
    #[error("unknown argument '{argument}'.")]
    UnknownArgument {
        /// The offending token.
        argument: String,
    },
    /// More values than positionals.
    #[error("too many arguments: '{argument}'.")]
    TooManyArguments {
        /// The first extra token.
        argument: String,
    },
    /// A flag at the end of the command line, without its value.
    #[error("option '{name}' requires a value.")]
    MissingValue {
        /// The flag.
        name: String,
    },
    /// A flag which takes a value within a bundle of short options (ex: `-vn`).
    #[error("option '-{option}' takes a value and cannot be bundled in '{bundle}'.")]
    BundledValue {
        /// The short name which takes a value.
        option: char,
        /// The whole bundle.
        bundle: String,
    },
    /// A value outside of the declared choices.
    #[error("'{token}' is not a valid choice for '{name}', choose from: {}.", .choices.join(", "))]
    NotAChoice {
        /// The descriptor.
        name: String,
        /// The offending value.
        token: String,
        /// The accepted values.
        choices: Vec<String>,
    },
    /// The value cannot be converted into the field.
    #[error("invalid value for '{name}': {source}")]
    Invalid {
        /// The descriptor.
        name: String,
        /// The conversion failure.
        source: CoerceError,
    },
    /// The callback of the descriptor failed.
    #[error("callback of '{name}' failed: {source}")]
    Callback {
        /// The descriptor.
        name: String,
        /// The callback failure.
        source: CallbackError,
    },
    /// A failure within a sub-command.
    #[error("{name}: {source}")]
    Subcommand {
        /// The sub-command.
        name: String,
        /// The failure, scoped to the sub-command.
        source: Box<ParseError>,
    },
    /// A default no longer applies when its sub-command is created.
    #[error("{source}")]
    Default {
        /// The rejected default.
        source: BuildError,
    },
    /// The help was requested; carries the usage text.
    #[error("help requested.")]
    Help(String),
    /// A callback asks the program to stop with this exit code.
    #[error("exit requested with code {0}.")]
    Exit(i32),
}

impl ParseError {
    /// The path of the sub-command in which the error occurred, outermost first.
    pub fn scope(&self) -> Vec<String> {
        let mut scope = Vec::default();
        let mut error = self;

        while let ParseError::Subcommand { name, source } = error {
            scope.push(name.clone());
            error = source;
        }

        scope
    }
}

/// Required descriptors still unset after parsing.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing required option(s): {}.", .missing.join(", "))]
pub struct RequiredError {
    missing: Vec<String>,
}

impl RequiredError {
    /// The missing descriptors (ex: `--name`, `TARGET`, `server --port`).
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

impl<R: Command> Schema<R> {
    /// Parse `tokens` into `record`.
    ///
    /// Tokens are processed in order:
    /// * `""` is skipped.
    /// * `-` disables the short options, `--` disables all options.
    /// * `--name` sets the flag `name`, `-x` the flag with short name `x`.
    /// Several short switches may be bundled (ex: `-vq`).
    /// * Anything else selects the sub-command of that name, or fills the next positional.
    ///
    /// A sub-command consumes every remaining token.
    pub fn parse(&self, record: &mut R, tokens: &[&str]) -> Result<Selection, ParseError> {
        self.dispatch(record, tokens, &self.name)
    }

    /// Report every required descriptor still unset, in the record and in each selected sub-command.
    pub fn validate(&self, record: &mut R, selection: &Selection) -> Result<(), RequiredError> {
        let mut missing = Vec::default();
        self.missing(record, selection.path(), "", &mut missing);

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RequiredError { missing })
        }
    }

    pub(crate) fn dispatch(
        &self,
        record: &mut R,
        tokens: &[&str],
        program: &str,
    ) -> Result<Selection, ParseError> {
        let mut short_disabled = false;
        let mut all_disabled = false;
        let mut positional = 0;
        let mut offset = 0;

        while offset < tokens.len() {
            let token = tokens[offset];
            offset += 1;
            trace!("Parsing token #{}: {token:?}.", offset - 1);

            if token.is_empty() {
                continue;
            }

            if token == "-" && !short_disabled {
                debug!("Disabling short options.");
                short_disabled = true;
                continue;
            }

            if token == "--" && !all_disabled {
                debug!("Disabling options.");
                short_disabled = true;
                all_disabled = true;
                continue;
            }

            if !all_disabled && token.len() >= 3 && token.starts_with("--") {
                let slot = self
                    .lookup(&token[2..])
                    .ok_or_else(|| ParseError::UnknownOption {
                        option: token.to_string(),
                    })?;
                self.activate(slot, record, tokens, &mut offset, program)?;
            } else if !short_disabled && token.len() >= 2 && token.starts_with('-') {
                self.activate_shorts(token, record, tokens, &mut offset, program)?;
            } else if let Some(Position::Subcommand(index)) = self.index.get(token) {
                let slot = &self.subcommands[*index];
                let selection = self.descend(slot, record, &tokens[offset..], program)?;
                return Ok(Selection::descend(&slot.descriptor.name, selection));
            } else if let Some(slot) = self.positionals.get(positional) {
                positional += 1;
                slot.set(record, token)?;
                self.fire(slot, record, program)?;
            } else if self.subcommands.is_empty() {
                return Err(ParseError::TooManyArguments {
                    argument: token.to_string(),
                });
            } else {
                return Err(ParseError::UnknownArgument {
                    argument: token.to_string(),
                });
            }
        }

        Ok(Selection::default())
    }

    // Long and short names share the one index, so `--f` and `-x` resolve either.
    fn lookup(&self, key: &str) -> Option<&Slot<R>> {
        match self.index.get(key) {
            Some(Position::Flag(index)) => Some(&self.flags[*index]),
            _ => None,
        }
    }

    fn activate_shorts(
        &self,
        token: &str,
        record: &mut R,
        tokens: &[&str],
        offset: &mut usize,
        program: &str,
    ) -> Result<(), ParseError> {
        let shorts: Vec<char> = token[1..].chars().collect();

        if shorts.len() == 1 {
            let slot = self
                .lookup(&token[1..])
                .ok_or_else(|| ParseError::UnknownOption {
                    option: token.to_string(),
                })?;
            return self.activate(slot, record, tokens, offset, program);
        }

        // Applied left to right; switches toggled before a failure stay toggled.
        for short in shorts {
            let slot = self
                .lookup(&short.to_string())
                .ok_or_else(|| ParseError::UnknownOption {
                    option: format!("-{short}"),
                })?;

            if slot.descriptor.kind != Kind::Flip {
                return Err(ParseError::BundledValue {
                    option: short,
                    bundle: token.to_string(),
                });
            }

            self.activate(slot, record, tokens, offset, program)?;
        }

        Ok(())
    }

    fn activate(
        &self,
        slot: &Slot<R>,
        record: &mut R,
        tokens: &[&str],
        offset: &mut usize,
        program: &str,
    ) -> Result<(), ParseError> {
        match slot.descriptor.kind {
            Kind::Flip => slot.flip(record)?,
            _ => {
                let value = tokens
                    .get(*offset)
                    .ok_or_else(|| ParseError::MissingValue {
                        name: slot.descriptor.name.clone(),
                    })?;
                *offset += 1;
                slot.set(record, value)?;
            }
        }

        self.fire(slot, record, program)
    }

    fn descend(
        &self,
        slot: &Slot<R>,
        record: &mut R,
        remaining: &[&str],
        program: &str,
    ) -> Result<Selection, ParseError> {
        let name = &slot.descriptor.name;
        let nest = match &slot.target {
            Target::Subcommand(nest) => nest,
            Target::Value(_) => {
                unreachable!("internal error - a sub-command must target a nested record")
            }
        };
        debug!("Descending into the sub-command '{name}'.");
        let selection = nest
            .dispatch(record, remaining, &format!("{program} {name}"))
            .map_err(|error| match error {
                ParseError::Help(_) | ParseError::Exit(_) => error,
                error => ParseError::Subcommand {
                    name: name.clone(),
                    source: Box::new(error),
                },
            })?;
        self.fire(slot, record, program)?;
        Ok(selection)
    }

    fn fire(&self, slot: &Slot<R>, record: &mut R, program: &str) -> Result<(), ParseError> {
        match &slot.trigger {
            None => Ok(()),
            Some(Trigger::Help) => Err(ParseError::Help(
                self.usage_text(program, terminal_width()),
            )),
            Some(Trigger::Callback(hook)) => {
                trace!("Invoking the callback of '{}'.", slot.descriptor.name);
                hook(record, &slot.descriptor).map_err(|error| match error {
                    CallbackError::Exit(code) => ParseError::Exit(code),
                    error => ParseError::Callback {
                        name: slot.descriptor.name.clone(),
                        source: error,
                    },
                })
            }
        }
    }

    pub(crate) fn missing(
        &self,
        record: &mut R,
        path: &[String],
        prefix: &str,
        out: &mut Vec<String>,
    ) {
        for slot in self.flags.iter().chain(self.positionals.iter()) {
            if slot.descriptor.required && slot.is_unset(record) {
                out.push(format!("{prefix}{}", slot.descriptor.label()));
            }
        }

        if let Some((name, rest)) = path.split_first() {
            if let Some(Position::Subcommand(index)) = self.index.get(name) {
                if let Target::Subcommand(nest) = &self.subcommands[*index].target {
                    nest.missing(record, rest, &format!("{prefix}{name} "), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Fields, Meta};
    use crate::parser::OptionDescriptor;
    use crate::test::record;
    use rstest::rstest;

    #[derive(Default, Debug)]
    struct Leaf {
        depth: u8,
        force: bool,
    }

    impl Command for Leaf {
        fn name() -> String {
            "leaf".to_string()
        }

        fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
            fields.field(
                "depth",
                |l: &mut Leaf| &mut l.depth,
                Meta::new().short('d').option("required"),
            );
            fields.field(
                "force",
                |l: &mut Leaf| &mut l.force,
                Meta::new().short('f'),
            );
        }
    }

    record!(Leaf);

    #[derive(Default, Debug)]
    struct Branch {
        help: bool,
        name: String,
        leaf: Option<Leaf>,
    }

    impl Command for Branch {
        fn name() -> String {
            "branch".to_string()
        }

        fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
            fields.field(
                "help",
                |b: &mut Branch| &mut b.help,
                Meta::new().short('h').callback("help"),
            );
            fields.field("name", |b: &mut Branch| &mut b.name, Meta::new());
            fields.field("leaf", |b: &mut Branch| &mut b.leaf, Meta::new());
        }
    }

    record!(Branch);

    #[derive(Default, Debug)]
    struct Root {
        flip: bool,
        quiet: bool,
        x: bool,
        count: i8,
        level: String,
        version: bool,
        source: Option<String>,
        target: Option<u32>,
        branch: Option<Branch>,
        calls: Vec<String>,
    }

    impl Command for Root {
        fn name() -> String {
            "root".to_string()
        }

        fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
            fields.register("record", |r: &mut Root, d: &OptionDescriptor| {
                r.calls.push(d.name().to_string());
                Ok(())
            });
            fields.register("reject", |_: &mut Root, _: &OptionDescriptor| {
                Err(CallbackError::Failed("rejected".to_string()))
            });
            fields.register("ver", |_: &mut Root, _: &OptionDescriptor| {
                Err(CallbackError::Exit(0))
            });
            fields.field(
                "flip",
                |r: &mut Root| &mut r.flip,
                Meta::new().short('f').callback("record"),
            );
            fields.field("quiet", |r: &mut Root| &mut r.quiet, Meta::new().short('q'));
            fields.field("x", |r: &mut Root| &mut r.x, Meta::new());
            fields.field(
                "count",
                |r: &mut Root| &mut r.count,
                Meta::new().short('c').callback("record"),
            );
            fields.field(
                "level",
                |r: &mut Root| &mut r.level,
                Meta::new().short('多').choice("warn info debug").callback("reject"),
            );
            fields.field(
                "version",
                |r: &mut Root| &mut r.version,
                Meta::new().short('V').callback("ver"),
            );
            fields.field("source", |r: &mut Root| &mut r.source, Meta::new());
            fields.field(
                "target",
                |r: &mut Root| &mut r.target,
                Meta::new().callback("record"),
            );
            fields.field("branch", |r: &mut Root| &mut r.branch, Meta::new());
        }
    }

    fn parse(root: &mut Root, tokens: &[&str]) -> Result<Selection, ParseError> {
        let schema = Schema::<Root>::build().unwrap();
        schema.parse(root, tokens)
    }

    #[rstest]
    #[case(vec![], false)]
    #[case(vec!["-f"], true)]
    #[case(vec!["--flip"], true)]
    #[case(vec!["-f", "-f"], false)]
    #[case(vec!["-ff", "--flip"], true)]
    #[case(vec!["-fq"], true)]
    #[case(vec!["", "-f", ""], true)]
    #[case(vec!["--f"], true)]
    #[case(vec!["--f", "-f"], false)]
    fn flip(#[case] tokens: Vec<&str>, #[case] expected: bool) {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &tokens).unwrap();

        // Verify
        assert_eq!(root.flip, expected);
    }

    #[rstest]
    #[case(vec!["-x"])]
    #[case(vec!["--x"])]
    #[case(vec!["-fx"])]
    fn single_letter_long_name(#[case] tokens: Vec<&str>) {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &tokens).unwrap();

        // Verify
        assert!(root.x);
    }

    #[test]
    fn bundle() {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &["-qf"]).unwrap();

        // Verify
        assert!(root.quiet);
        assert!(root.flip);
        assert_eq!(root.calls, vec!["flip"]);
    }

    #[test]
    fn bundle_value() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["-fc", "1"]);

        // Verify
        assert_matches!(result, Err(ParseError::BundledValue { option: 'c', bundle }) => {
            assert_eq!(bundle, "-fc");
        });
        // No rollback of what was applied before the failure.
        assert!(root.flip);
        assert_eq!(root.count, 0);
    }

    #[rstest]
    #[case(vec!["-c", "0x10"], 16)]
    #[case(vec!["--count", "-0b11"], -3)]
    #[case(vec!["--count", "1", "-c", "2"], 2)]
    fn flag(#[case] tokens: Vec<&str>, #[case] expected: i8) {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &tokens).unwrap();

        // Verify
        assert_eq!(root.count, expected);
    }

    #[test]
    fn flag_callback_order() {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &["-c", "1", "a", "-f", "2"]).unwrap();

        // Verify
        assert_eq!(root.calls, vec!["count", "flip", "target"]);
        assert_eq!(root.source, Some("a".to_string()));
        assert_eq!(root.target, Some(2));
    }

    #[test]
    fn flag_overflow() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["-c", "0x1234"]);

        // Verify
        assert_matches!(result, Err(ParseError::Invalid { name, source: CoerceError::Overflow { .. } }) => {
            assert_eq!(name, "count");
        });
        assert_eq!(root.count, 0);
        assert!(root.calls.is_empty());
    }

    #[rstest]
    #[case(vec!["--count"], "count")]
    #[case(vec!["-c"], "count")]
    #[case(vec!["-f", "--level"], "level")]
    fn missing_value(#[case] tokens: Vec<&str>, #[case] expected: &str) {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &tokens);

        // Verify
        assert_matches!(result, Err(ParseError::MissingValue { name }) if name == expected);
    }

    #[rstest]
    #[case(vec!["--nope"], "--nope")]
    #[case(vec!["-z"], "-z")]
    #[case(vec!["-fz"], "-z")]
    #[case(vec!["--z"], "--z")]
    #[case(vec!["--source", "a"], "--source")]
    fn unknown_option(#[case] tokens: Vec<&str>, #[case] expected: &str) {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &tokens);

        // Verify
        assert_matches!(result, Err(ParseError::UnknownOption { option }) if option == expected);
    }

    #[test]
    fn unknown_option_no_rollback() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["-f", "--nope", "-q"]);

        // Verify
        assert_matches!(result, Err(ParseError::UnknownOption { .. }));
        assert!(root.flip);
        assert!(!root.quiet);
    }

    #[rstest]
    #[case(vec!["-", "-f"], Some("-f"), false)]
    #[case(vec!["-", "--flip", "-x"], Some("-x"), true)]
    #[case(vec!["--", "--flip"], Some("--flip"), false)]
    #[case(vec!["--", "-"], Some("-"), false)]
    #[case(vec!["-", "-"], Some("-"), false)]
    #[case(vec!["-f", "--"], None, true)]
    fn disable(#[case] tokens: Vec<&str>, #[case] source: Option<&str>, #[case] flip: bool) {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &tokens).unwrap();

        // Verify
        assert_eq!(root.source.as_deref(), source);
        assert_eq!(root.flip, flip);
    }

    #[test]
    fn disable_long_kept() {
        // Setup
        let mut root = Root::default();

        // Execute
        parse(&mut root, &["-", "--flip", "--count", "3"]).unwrap();

        // Verify
        assert!(root.flip);
        assert_eq!(root.count, 3);
    }

    #[test]
    fn too_many_arguments() {
        #[derive(Default)]
        struct Flat {
            only: Option<String>,
        }

        impl Command for Flat {
            fn name() -> String {
                "flat".to_string()
            }

            fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
                fields.field("only", |f: &mut Flat| &mut f.only, Meta::new());
            }
        }

        // Setup
        let schema = Schema::<Flat>::build().unwrap();
        let mut flat = Flat::default();

        // Execute
        let result = schema.parse(&mut flat, &["a", "b"]);

        // Verify
        assert_matches!(result, Err(ParseError::TooManyArguments { argument }) if argument == "b");
        assert_eq!(flat.only, Some("a".to_string()));
    }

    #[test]
    fn unknown_argument() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["a", "1", "nope"]);

        // Verify
        assert_matches!(result, Err(ParseError::UnknownArgument { argument }) if argument == "nope");
    }

    #[test]
    fn choices() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["-多", "loud"]);

        // Verify
        assert_matches!(result, Err(ParseError::NotAChoice { name, token, choices }) => {
            assert_eq!(name, "level");
            assert_eq!(token, "loud");
            assert_eq!(choices, vec!["debug", "info", "warn"]);
        });
        assert_eq!(root.level, "");
    }

    #[test]
    fn callback_failed() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["--level", "info", "-f"]);

        // Verify
        assert_matches!(result, Err(ParseError::Callback { name, source: CallbackError::Failed(message) }) => {
            assert_eq!(name, "level");
            assert_eq!(message, "rejected");
        });
        // The value is set before the callback runs, and parsing stops after it.
        assert_eq!(root.level, "info");
        assert!(!root.flip);
    }

    #[test]
    fn callback_exit() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["-V", "-f"]);

        // Verify
        assert_matches!(result, Err(ParseError::Exit(0)));
        assert!(root.version);
        assert!(!root.flip);
    }

    #[test]
    fn subcommand() {
        // Setup
        let mut root = Root::default();

        // Execute
        let selection = parse(&mut root, &["-f", "branch", "--name", "x", "leaf", "-d", "4", "-f"])
            .unwrap();

        // Verify
        assert_eq!(selection.path(), &["branch", "leaf"]);
        assert!(root.flip);
        let branch = root.branch.unwrap();
        assert_eq!(branch.name, "x");
        let leaf = branch.leaf.unwrap();
        assert_eq!(leaf.depth, 4);
        // The trailing `-f` belongs to the sub-command.
        assert!(leaf.force);
    }

    #[test]
    fn subcommand_takes_remaining() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["branch", "-q"]);

        // Verify
        assert_matches!(result, Err(ParseError::Subcommand { name, source }) => {
            assert_eq!(name, "branch");
            assert_matches!(*source, ParseError::UnknownOption { option } if option == "-q");
        });
        assert!(!root.quiet);
    }

    #[test]
    fn subcommand_nested_error() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["branch", "leaf", "--depth", "x"]);

        // Verify
        let error = result.unwrap_err();
        assert_eq!(
            error.to_string(),
            "branch: leaf: invalid value for 'depth': 'x' is not a valid UINT."
        );
        assert_eq!(error.scope(), vec!["branch", "leaf"]);
        assert_matches!(error, ParseError::Subcommand { name, source } => {
            assert_eq!(name, "branch");
            assert_matches!(*source, ParseError::Subcommand { name, .. } if name == "leaf");
        });
    }

    #[test]
    fn subcommand_help() {
        // Setup
        let mut root = Root::default();

        // Execute
        let result = parse(&mut root, &["branch", "-h"]);

        // Verify
        assert_matches!(result, Err(ParseError::Help(usage)) => {
            assert!(usage.starts_with("usage: root branch [OPTION] [SUB]"), "{usage}");
        });
    }

    #[test]
    fn validate() {
        // Setup
        let schema = Schema::<Root>::build().unwrap();
        let mut root = Root::default();
        let selection = schema.parse(&mut root, &["a", "branch", "leaf"]).unwrap();

        // Execute
        let result = schema.validate(&mut root, &selection);

        // Verify
        assert_matches!(result, Err(error) => {
            assert_eq!(error.missing(), &["TARGET", "branch leaf --depth"]);
            assert_eq!(
                error.to_string(),
                "missing required option(s): TARGET, branch leaf --depth."
            );
        });
    }

    #[test]
    fn validate_complete() {
        // Setup
        let schema = Schema::<Root>::build().unwrap();
        let mut root = Root::default();
        let selection = schema.parse(&mut root, &["a", "1"]).unwrap();

        // Execute
        let result = schema.validate(&mut root, &selection);

        // Verify
        result.unwrap();
    }

    #[test]
    fn reparse() {
        // Setup
        let schema = Schema::<Root>::build().unwrap();
        let mut root = Root::default();
        schema.parse(&mut root, &["-f"]).unwrap();

        // Execute
        schema.parse(&mut root, &["-f", "-c", "5"]).unwrap();

        // Verify
        assert!(!root.flip);
        assert_eq!(root.count, 5);
    }
}
