//! Builder module for `fieldopt`.
//! See [documentation root](https://docs.rs/fieldopt/latest/fieldopt/index.html) for full details.
#![deny(missing_docs)]
mod api;
pub mod coerce;
mod constant;
mod model;
mod parser;

pub use api::*;
pub use coerce::CoerceError;
pub use model::*;
pub use parser::{
    BuildError, CommandLineParser, ConsoleInterface, Nest, OptionDescriptor, ParseError,
    RequiredError, Schema, Selection, UserInterface,
};

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
