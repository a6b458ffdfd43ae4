use crate::model::{DeriveParameter, FieldRole, MetaCall};
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};

impl DeriveParameter {
    /// The declaration of this field within `Command::declare`.
    pub(crate) fn generate(self) -> TokenStream2 {
        let DeriveParameter {
            field_name,
            role,
            meta,
        } = self;
        let field_name_str = field_name.to_string();
        let declare = match role {
            FieldRole::Field => format_ident!("field"),
            FieldRole::Embed => format_ident!("embed"),
        };
        let calls = meta.into_iter().map(|MetaCall { method, value }| {
            let tokens = value.tokens;
            quote! { .#method(#tokens) }
        });

        quote! {
            fields.#declare(
                #field_name_str,
                |record: &mut Self| &mut record.#field_name,
                ::fieldopt::Meta::new() #( #calls )*,
            );
        }
    }
}
