use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

use crate::model::{DeriveCommand, DeriveParameter};

impl From<DeriveCommand> for TokenStream2 {
    fn from(value: DeriveCommand) -> Self {
        let DeriveCommand {
            struct_name,
            generics,
            name,
            help,
            callbacks,
            parameters,
        } = value;
        let (impl_generics, type_generics, where_clause) = generics.split_for_impl();
        let name = name.tokens;
        let help = help.map(|help| {
            let help = help.tokens;
            quote! {
                fn help() -> ::std::option::Option<::std::string::String> {
                    ::std::option::Option::Some(::std::string::String::from(#help))
                }
            }
        });
        let registrations = callbacks.iter().map(|path| {
            // Registered under the function name, without its module path.
            let callback_name = path
                .segments
                .last()
                .map(|segment| segment.ident.to_string())
                .unwrap_or_default();
            quote! {
                fields.register(#callback_name, #path);
            }
        });
        let declarations = parameters.into_iter().map(DeriveParameter::generate);

        quote! {
            impl #impl_generics ::fieldopt::Command for #struct_name #type_generics #where_clause {
                fn name() -> ::std::string::String {
                    ::std::string::String::from(#name)
                }

                #help

                fn declare<P: 'static>(fields: &mut ::fieldopt::Fields<P, Self>) {
                    #( #registrations )*
                    #( #declarations )*
                }
            }

            impl #impl_generics ::fieldopt::Bindable for #struct_name #type_generics #where_clause {
                fn shape() -> ::fieldopt::Shape {
                    ::fieldopt::Shape::Record
                }

                fn nest<P: 'static>(
                    lens: ::fieldopt::Lens<P, Self>,
                ) -> ::std::option::Option<::std::result::Result<::fieldopt::Nest<P>, ::fieldopt::BuildError>> {
                    ::std::option::Option::Some(::fieldopt::Nest::direct(lens))
                }

                fn nest_optional<P: 'static>(
                    lens: ::fieldopt::Lens<P, ::std::option::Option<Self>>,
                ) -> ::std::option::Option<::std::result::Result<::fieldopt::Nest<P>, ::fieldopt::BuildError>> {
                    ::std::option::Option::Some(::fieldopt::Nest::optional(lens))
                }
            }
        }
    }
}
