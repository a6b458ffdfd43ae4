mod descriptor;
mod dispatch;
mod interface;
mod middleware;
mod nested;
mod printer;
mod schema;

pub(crate) use descriptor::*;
pub use descriptor::OptionDescriptor;
pub use dispatch::{ParseError, RequiredError, Selection};
pub use interface::{ConsoleInterface, UserInterface};
pub use middleware::CommandLineParser;
pub use nested::Nest;
pub(crate) use printer::*;
pub use schema::{BuildError, Schema};

#[cfg(test)]
pub(crate) use interface::util;
