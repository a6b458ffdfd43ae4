use fieldopt::{CallbackError, Command, OptionDescriptor};
use ipnet::IpNet;
use std::time::Duration;

#[derive(Debug, Default, Command)]
#[fieldopt(help = "A sub-command with forced flags.")]
pub struct Sub {
    #[fieldopt(short = 'h', callback = "help", help = "show this message")]
    pub help: bool,
    #[fieldopt(short = 'f', option = "flag", help = "flip the value")]
    pub flip: Option<bool>,
    #[fieldopt(short = 'n', option = "flag", help = "set as name")]
    pub name: Option<String>,
    #[fieldopt(short = 'a', option = "flag", help = "force set as flag")]
    pub age: Option<u32>,
}

#[derive(Debug, Default, Command)]
#[fieldopt(callback = ver)]
pub struct Example {
    #[fieldopt(short = 'h', callback = "help", help = "show this message")]
    pub help: bool,
    #[fieldopt(name = "log", choice = "warn info debug trac3", help = "set log level")]
    pub log_level: String,
    #[fieldopt(short = 'v', help = "show version info", callback = "ver")]
    pub version: bool,

    #[allow(dead_code)]
    private: bool,
    #[fieldopt(ignore)]
    pub ignore: bool,
    #[fieldopt(option = "skip")]
    pub skip: bool,

    #[fieldopt(short = 'f', help = "flip the value")]
    pub flip: bool,
    #[fieldopt(short = 'n', help = "set as name", default = "john")]
    pub name: String,
    #[fieldopt(short = 'a', help = "force set as flag", option = "trunc")]
    pub age: u8,
    #[fieldopt(help = "how long to wait")]
    pub wait: Duration,
    #[fieldopt(option = "flag", help = "please type the valid CIDR")]
    pub cidr: Option<IpNet>,

    #[fieldopt(help = "required argument")]
    pub arg1: Option<i32>,
    #[fieldopt(help = "required argument")]
    pub arg2: Option<String>,

    #[fieldopt(help = "sub-command")]
    pub sub: Option<Sub>,
}

fn ver(_: &mut Example, _: &OptionDescriptor) -> Result<(), CallbackError> {
    println!("example: v{}", env!("CARGO_PKG_VERSION"));
    Err(CallbackError::Exit(0))
}

fn main() {
    let mut example = Example {
        age: 55,
        ..Example::default()
    };
    fieldopt::CommandLineParser::new(&mut example).run();

    println!("{example:#?}");
}
