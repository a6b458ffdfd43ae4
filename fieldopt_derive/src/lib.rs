//! `#[derive(Command)]` for `fieldopt`.
//! See [documentation root](https://docs.rs/fieldopt/latest/fieldopt/index.html) for full details.
extern crate proc_macro;

mod generate;
mod load;
mod model;

use crate::model::DeriveCommand;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

/// Derive `fieldopt::Command` and `fieldopt::Bindable` for a struct with named fields.
///
/// Every `pub` field is declared in order; the field attributes are
/// `#[fieldopt(name = "..", short = 'c', help = "..", callback = "name" | path, choice = "a b",
/// default = "..", option = "flag,skip,trunc,required")]`, a bare `#[fieldopt(ignore)]`,
/// or `#[fieldopt(embed)]` to promote the fields of a nested record.
/// On the struct, `#[fieldopt(name = "..", help = "..", callback = path)]`.
#[proc_macro_derive(Command, attributes(fieldopt))]
pub fn command(input: TokenStream) -> TokenStream {
    let derive_input = syn::parse_macro_input!(input as syn::DeriveInput);

    match DeriveCommand::try_from(derive_input) {
        Ok(command) => TokenStream2::from(command).into(),
        Err(error) => error.to_compile_error().into(),
    }
}
