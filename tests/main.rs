use assert_matches::assert_matches;
use chrono::{DateTime, FixedOffset};
use fieldopt::{
    CallbackError, Command, CommandLineParser, FileMode, Kind, OptionDescriptor, ParseError,
    TypeHint, UserInterface,
};
use rstest::rstest;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::Dispatch;

#[derive(Default, Clone)]
struct Recorder {
    messages: Rc<RefCell<Vec<String>>>,
    errors: Rc<RefCell<Vec<String>>>,
}

impl UserInterface for Recorder {
    fn print(&self, message: String) {
        self.messages.borrow_mut().push(message);
    }

    fn print_error(&self, error: String) {
        self.errors.borrow_mut().push(error);
    }
}

#[derive(Debug, Default, Command)]
#[fieldopt(help = "Serve the files.")]
pub struct Serve {
    #[fieldopt(short = 'h', callback = "help")]
    pub help: bool,
    #[fieldopt(short = 'p', default = "8080", help = "listening port")]
    pub port: u16,
    #[fieldopt(option = "required")]
    pub root: String,
}

#[derive(Debug, Default, Command)]
#[fieldopt(callback = quiet_down)]
pub struct Common {
    #[fieldopt(short = 'q', callback = "quiet_down")]
    pub quiet: bool,
    #[fieldopt(default = "3")]
    pub level: u8,
}

fn quiet_down(common: &mut Common, _: &OptionDescriptor) -> Result<(), CallbackError> {
    common.level = 0;
    Ok(())
}

#[derive(Debug, Default, Command)]
#[fieldopt(name = "tool", help = "Does a few things.", callback = reject_odd)]
pub struct Tool {
    #[fieldopt(short = 'h', callback = "help", help = "show this message")]
    pub help: bool,
    #[fieldopt(short = 'v')]
    pub verbose: bool,
    #[fieldopt(choice = "warn info debug", default = "info")]
    pub log_level: String,
    #[fieldopt(short = 'c', callback = "reject_odd")]
    pub count: i32,
    #[fieldopt(option = "trunc")]
    pub small: u8,
    #[fieldopt(callback = stop)]
    pub stop: bool,
    #[fieldopt(embed)]
    pub common: Common,
    #[fieldopt(help = "where to read from")]
    pub source: Option<String>,
    #[fieldopt(help = "run as a server")]
    pub serve: Option<Serve>,
    #[fieldopt(ignore)]
    pub ignored: bool,
    #[allow(dead_code)]
    hidden: bool,
}

fn reject_odd(tool: &mut Tool, descriptor: &OptionDescriptor) -> Result<(), CallbackError> {
    if tool.count % 2 == 0 {
        Ok(())
    } else {
        Err(CallbackError::Failed(format!(
            "{} must be even",
            descriptor.name()
        )))
    }
}

fn stop(_: &mut Tool, _: &OptionDescriptor) -> Result<(), CallbackError> {
    Err(CallbackError::Exit(7))
}

#[test]
fn defaults() {
    // Setup
    let mut tool = Tool::default();

    // Execute
    let parser = CommandLineParser::try_new(&mut tool).unwrap();
    drop(parser);

    // Verify
    assert_eq!(tool.log_level, "info");
    assert_eq!(tool.common.level, 3);
    assert!(tool.serve.is_none());
}

#[test]
fn schema() {
    // Setup
    let mut tool = Tool::default();

    // Execute
    let parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Verify
    let schema = parser.schema();
    assert_eq!(schema.name(), "tool");
    let descriptors: Vec<(&str, Kind, TypeHint)> = schema
        .descriptors()
        .map(|d| (d.name(), d.kind(), d.type_hint()))
        .collect();
    assert_eq!(
        descriptors,
        vec![
            ("help", Kind::Flip, TypeHint::None),
            ("verbose", Kind::Flip, TypeHint::None),
            ("log-level", Kind::Flag, TypeHint::Str),
            ("count", Kind::Flag, TypeHint::Int),
            ("small", Kind::Flag, TypeHint::Uint),
            ("stop", Kind::Flip, TypeHint::None),
            ("quiet", Kind::Flip, TypeHint::None),
            ("level", Kind::Flag, TypeHint::Uint),
            ("source", Kind::Argument, TypeHint::Str),
            ("serve", Kind::Subcommand, TypeHint::None),
        ]
    );
}

#[test]
fn parse() {
    // Setup
    let mut tool = Tool::default();
    let mut parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    parser
        .parse(&[
            "-v",
            "--log-level",
            "debug",
            "-c",
            "0x10",
            "--small",
            "300",
            "input.txt",
        ])
        .unwrap();
    drop(parser);

    // Verify
    assert!(tool.verbose);
    assert_eq!(tool.log_level, "debug");
    assert_eq!(tool.count, 16);
    assert_eq!(tool.small, 44);
    assert_eq!(tool.source.as_deref(), Some("input.txt"));
    assert!(!tool.ignored);
}

#[test]
fn parse_embedded() {
    // Setup
    let mut tool = Tool::default();
    let mut parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    parser.parse(&["-vq", "input.txt"]).unwrap();
    drop(parser);

    // Verify
    assert!(tool.verbose);
    assert!(tool.common.quiet);
    assert_eq!(tool.common.level, 0);
}

#[test]
fn parse_subcommand() {
    // Setup
    let mut tool = Tool::default();
    let mut parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    parser
        .parse(&["input.txt", "serve", "--root", "/tmp", "-p", "80"])
        .unwrap();
    assert_eq!(parser.selection().path(), &["serve".to_string()]);
    drop(parser);

    // Verify
    assert_matches!(tool.serve, Some(Serve { port: 80, root, .. }) if root == "/tmp");
}

#[test]
fn parse_subcommand_defaults() {
    // Setup
    let mut tool = Tool::default();
    let mut parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    parser.parse(&["input.txt", "serve"]).unwrap();
    drop(parser);

    // Verify
    assert_matches!(tool.serve, Some(Serve { port: 8080, .. }));
}

#[rstest]
#[case(vec!["--nope"], "unknown option '--nope'.")]
#[case(vec!["-x"], "unknown option '-x'.")]
#[case(vec!["-vc"], "option '-c' takes a value and cannot be bundled in '-vc'.")]
#[case(vec!["--count"], "option 'count' requires a value.")]
#[case(
    vec!["--log-level", "trace"],
    "'trace' is not a valid choice for 'log-level', choose from: debug, info, warn."
)]
#[case(vec!["-c", "3"], "callback of 'count' failed: count must be even")]
#[case(vec!["a", "b"], "unknown argument 'b'.")]
#[case(
    vec!["a", "serve", "--port", "x"],
    "serve: invalid value for 'port': 'x' is not a valid UINT."
)]
fn parse_invalid(#[case] tokens: Vec<&str>, #[case] expected: &str) {
    // Setup
    let mut tool = Tool::default();
    let mut parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    let error = parser.parse(&tokens).unwrap_err();

    // Verify
    assert_eq!(error.to_string(), expected);
}

#[test]
fn parse_tokens_help() {
    // Setup
    let mut tool = Tool::default();
    let recorder = Recorder::default();
    let mut parser = CommandLineParser::try_new(&mut tool)
        .unwrap()
        .interface(Box::new(recorder.clone()));

    // Execute
    let exit_code = parser.parse_tokens(&["-h"]).unwrap_err();

    // Verify
    assert_eq!(exit_code, 0);
    let messages = recorder.messages.borrow();
    assert_eq!(messages.len(), 1);
    assert!(
        messages[0].starts_with("usage: tool [OPTION] SOURCE [SUB]\n\nDoes a few things.\n"),
        "{}",
        messages[0]
    );
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
fn parse_tokens_exit() {
    // Setup
    let mut tool = Tool::default();
    let recorder = Recorder::default();
    let mut parser = CommandLineParser::try_new(&mut tool)
        .unwrap()
        .interface(Box::new(recorder.clone()));

    // Execute
    let exit_code = parser.parse_tokens(&["--stop"]).unwrap_err();

    // Verify
    assert_eq!(exit_code, 7);
    assert!(recorder.messages.borrow().is_empty());
    assert!(recorder.errors.borrow().is_empty());
}

#[test]
fn parse_tokens_subcommand_error() {
    // Setup
    let mut tool = Tool::default();
    let recorder = Recorder::default();
    let mut parser = CommandLineParser::try_new(&mut tool)
        .unwrap()
        .interface(Box::new(recorder.clone()));

    // Execute
    let exit_code = parser
        .parse_tokens(&["a", "serve", "--nope"])
        .unwrap_err();

    // Verify
    assert_eq!(exit_code, 1);
    let errors = recorder.errors.borrow();
    assert!(
        errors[0].starts_with("error: serve: unknown option '--nope'.\nusage: tool serve [OPTION]"),
        "{}",
        errors[0]
    );
}

#[rstest]
#[case(vec![], "missing required option(s): SOURCE.")]
#[case(
    vec!["a", "serve"],
    "missing required option(s): serve --root."
)]
fn parse_tokens_required(#[case] tokens: Vec<&str>, #[case] expected: &str) {
    // Setup
    let mut tool = Tool::default();
    let recorder = Recorder::default();
    let mut parser = CommandLineParser::try_new(&mut tool)
        .unwrap()
        .interface(Box::new(recorder.clone()));

    // Execute
    let exit_code = parser.parse_tokens(&tokens).unwrap_err();

    // Verify
    assert_eq!(exit_code, 1);
    let errors = recorder.errors.borrow();
    assert!(
        errors[0].starts_with(&format!("error: {expected}\nusage: tool")),
        "{}",
        errors[0]
    );
}

#[test]
fn usage() {
    // Setup
    let mut tool = Tool::default();
    let parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    let lines: Vec<String> = parser
        .schema()
        .descriptors()
        .map(OptionDescriptor::display)
        .collect();

    // Verify
    assert_eq!(
        lines,
        vec![
            "    -h       --help              show this message",
            "    -v       --verbose",
            "             --log-level STR     [debug info warn] (default: info)",
            "    -c  INT  --count INT",
            "             --small UINT",
            "             --stop",
            "    -q       --quiet",
            "             --level UINT        (default: 3)",
            "    SOURCE [STR] where to read from",
            "    serve        run as a server",
        ]
    );
}

#[test]
fn parse_error_type() {
    // Setup
    let mut tool = Tool::default();
    let mut parser = CommandLineParser::try_new(&mut tool).unwrap();

    // Execute
    let error = parser.parse(&["--level", "300"]).unwrap_err();

    // Verify
    assert_matches!(error, ParseError::Invalid { name, .. } if name == "level");
}

#[derive(Debug, Default, Command)]
pub struct Typed {
    pub ratio: f64,
    pub mode: FileMode,
    pub at: Option<DateTime<FixedOffset>>,
    pub wait: Duration,
    pub input: Option<File>,
}

#[test]
fn parse_typed() {
    // Setup
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "abc").unwrap();
    let path = file.path().to_string_lossy().to_string();
    let mut typed = Typed::default();
    let mut parser = CommandLineParser::try_new(&mut typed).unwrap();

    // Execute
    parser
        .parse(&[
            "--ratio",
            "-3/4",
            "--mode",
            "0644",
            "--wait",
            "1m30s",
            "2024-01-02T03:04:05+08:00",
            path.as_str(),
        ])
        .unwrap();
    drop(parser);

    // Verify
    assert_eq!(typed.ratio, -0.75);
    assert_eq!(typed.mode, FileMode(0o644));
    assert_eq!(
        typed.at,
        Some(DateTime::parse_from_rfc3339("2024-01-02T03:04:05+08:00").unwrap())
    );
    assert_eq!(typed.wait, Duration::from_secs(90));
    let mut content = String::default();
    typed.input.unwrap().read_to_string(&mut content).unwrap();
    assert_eq!(content, "abc");
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn with_dispatch() {
    // Setup
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let mut tool = Tool::default();

    // Execute
    let mut parser = CommandLineParser::with_dispatch(&mut tool, Dispatch::new(subscriber)).unwrap();
    parser.parse(&["-v", "input.txt"]).unwrap();
    drop(parser);

    // Verify
    assert!(tool.verbose);
    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("Parsing token"), "{logs}");
}
