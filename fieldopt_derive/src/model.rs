use proc_macro2::TokenStream as TokenStream2;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub(crate) struct DeriveValue {
    pub tokens: TokenStream2,
}

impl PartialEq for DeriveValue {
    fn eq(&self, other: &Self) -> bool {
        self.tokens.to_string() == other.tokens.to_string()
    }
}

impl Eq for DeriveValue {}

/// The raw contents of every `#[fieldopt(..)]` on one item.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct IntermediateAttributes {
    pub singletons: HashSet<String>,
    pub pairs: HashMap<String, Vec<DeriveValue>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldRole {
    Field,
    Embed,
}

/// One `Meta` builder call (ex: `.short('v')`).
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MetaCall {
    pub method: syn::Ident,
    pub value: DeriveValue,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DeriveParameter {
    pub field_name: syn::Ident,
    pub role: FieldRole,
    pub meta: Vec<MetaCall>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DeriveCommand {
    pub struct_name: syn::Ident,
    pub generics: syn::Generics,
    pub name: DeriveValue,
    pub help: Option<DeriveValue>,
    pub callbacks: Vec<syn::Path>,
    pub parameters: Vec<DeriveParameter>,
}
