use crate::load::{collect_attributes, reject_unknown, single};
use crate::model::{DeriveCommand, DeriveParameter, DeriveValue};
use quote::quote;

impl TryFrom<syn::DeriveInput> for DeriveCommand {
    type Error = syn::Error;

    fn try_from(value: syn::DeriveInput) -> Result<Self, Self::Error> {
        let struct_name = value.ident.clone();
        let attributes = collect_attributes(&value.attrs)?;
        reject_unknown(&attributes, &[], &["name", "help", "callback"], &struct_name)?;

        let name = match single(&attributes, "name", &struct_name)? {
            Some(value) => value.clone(),
            None => {
                let name = struct_name.to_string().to_lowercase();
                DeriveValue {
                    tokens: quote! { #name },
                }
            }
        };
        let help = single(&attributes, "help", &struct_name)?.cloned();
        let callbacks = attributes
            .pairs
            .get("callback")
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|value| {
                syn::parse2::<syn::Path>(value.tokens.clone()).map_err(|_| {
                    syn::Error::new(
                        struct_name.span(),
                        format!(
                            "Invalid - a record `callback` expects a function path, found `{}`.",
                            value.tokens
                        ),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let parameters = match &value.data {
            syn::Data::Struct(syn::DataStruct {
                fields: syn::Fields::Named(fields),
                ..
            }) => fields
                .named
                .iter()
                .map(DeriveParameter::load)
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect(),
            syn::Data::Struct(syn::DataStruct {
                fields: syn::Fields::Unit,
                ..
            }) => Vec::default(),
            _ => {
                return Err(syn::Error::new(
                    struct_name.span(),
                    "Invalid - only structs with named fields can derive `Command`.",
                ));
            }
        };

        Ok(DeriveCommand {
            struct_name,
            generics: value.generics,
            name,
            help,
            callbacks,
            parameters,
        })
    }
}
