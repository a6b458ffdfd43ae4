//! `fieldopt` turns a plain record into a command line parser.
//!
//! Annotate the record once; every `pub` field becomes an option, a positional argument or a sub-command:
//! * `bool` fields are *switches* (ex: `-v`, `--verbose`), toggled each time they appear.
//! * `Option<T>` fields of a value type are positional *arguments*, consumed in declaration order.
//! * Records (ex: `Option<Sub>`) are *sub-commands*, which consume the rest of the command line.
//! * Every other field is a *flag* taking exactly one value (ex: `--name NAME`).
//!
//! Values are coerced from their type: integers in any of `0x`, `0b`, `0o`/`0` or decimal,
//! rationals (`1/3`), files, file modes, RFC 3339 timestamps, durations (`1h30m`),
//! network interfaces, IP addresses and CIDR networks.
//!
//! # Usage
//! ```no_run
#![doc = include_str!("../demos/simple.rs")]
//! ```
//!
//! Generates the Cli program:
//! ```console
//! $ simple -h
//! usage: simple [OPTION] COUNT
//!
//! Count down.
//!
//! options:
//!     -h       --help              show this message
//!     -v       --verbose           print each step
//!     -f  STR  --from STR          the name counting (default: john)
//!
//! arguments:
//!     COUNT [UINT] where to start from
//!
//! $ simple -v -f jane 0x3
//! jane: 3
//! jane: 2
//! jane: 1
//!
//! $ simple --from
//! error: option 'from' requires a value.
//! usage: simple [OPTION] COUNT
//! ..
//! ```
//!
//! # Attributes
//! On fields:
//! * `name = ".."`: the long name (default: the field name, lower-cased, with `_` as `-`).
//! * `short = 'c'`: the short name.
//! * `help = ".."`: the text shown in the usage.
//! * `callback = "name"` or `callback = path::to::function`: invoked after every successful set.
//! The name `help` is built-in: it prints the usage and stops.
//! * `choice = "a b c"`: the accepted values.
//! * `default = ".."`: applied when the parser is built, and shown in the usage.
//! * `option = "flag,skip,trunc,required"`: force a flag, skip the field, narrow overflowing integers, or require a value.
//! * `ignore`: keep the field off the command line.
//! * `embed`: declare the fields of a nested record in place of the record.
//!
//! On the struct:
//! * `name = ".."`, `help = ".."`: shown in the usage.
//! * `callback = path::to::function`: register a named callback, usable via `callback = "function"`.
//!
//! # Builder Api
//! The derive emits calls to [`Fields`] and [`Meta`]; a [`Command`] may equally be implemented by hand.
//! ```
//! use fieldopt::{Command, CommandLineParser, Fields, Meta};
//!
//! #[derive(Default)]
//! struct Args {
//!     verbose: bool,
//!     level: String,
//! }
//!
//! impl Command for Args {
//!     fn name() -> String {
//!         "args".to_string()
//!     }
//!
//!     fn declare<P: 'static>(fields: &mut Fields<P, Self>) {
//!         fields.field("verbose", |a: &mut Args| &mut a.verbose, Meta::new().tag(r#"short:"v""#));
//!         fields.field("level", |a: &mut Args| &mut a.level, Meta::new().choice("warn info"));
//!     }
//! }
//!
//! let mut args = Args::default();
//! let mut parser = CommandLineParser::try_new(&mut args).unwrap();
//! parser.parse(&["-v", "--level", "info"]).unwrap();
//! drop(parser);
//!
//! assert!(args.verbose);
//! assert_eq!(args.level, "info");
//! ```
pub use fieldopt_builder::*;

/// Derive [`Command`] for a struct with named fields; see [Attributes](#attributes).
pub use fieldopt_derive::Command;
