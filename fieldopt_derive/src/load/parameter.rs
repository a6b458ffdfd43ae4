use crate::load::{collect_attributes, incompatible_error, reject_unknown, single};
use crate::model::{DeriveParameter, DeriveValue, FieldRole, MetaCall};
use quote::{format_ident, ToTokens};

// In the order the `Meta` calls are emitted.
const META_KEYS: [&str; 7] = [
    "name", "short", "help", "callback", "choice", "default", "option",
];

impl DeriveParameter {
    /// The parameter of `field`, or `None` when the field stays off the command line
    /// (it is not `pub`, or it is marked `ignore`).
    pub(crate) fn load(field: &syn::Field) -> Result<Option<Self>, syn::Error> {
        let Some(field_name) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(
                field,
                "Invalid - only structs with named fields can derive `Command`.",
            ));
        };
        let attributes = collect_attributes(&field.attrs)?;
        reject_unknown(&attributes, &["ignore", "embed"], &META_KEYS, &field_name)?;
        let ignore = attributes.singletons.contains("ignore");
        let embed = attributes.singletons.contains("embed");

        if ignore {
            if let Some(other) = attributes
                .singletons
                .iter()
                .find(|key| key.as_str() != "ignore")
                .or_else(|| attributes.pairs.keys().min())
            {
                return Err(incompatible_error(
                    &field_name,
                    "#[fieldopt(ignore)]",
                    format!("#[fieldopt({other})]"),
                ));
            }

            return Ok(None);
        }

        if !matches!(field.vis, syn::Visibility::Public(_)) {
            return Ok(None);
        }

        if embed {
            if let Some(other) = META_KEYS
                .iter()
                .find(|key| **key != "option" && attributes.pairs.contains_key(**key))
            {
                return Err(incompatible_error(
                    &field_name,
                    "#[fieldopt(embed)]",
                    format!("#[fieldopt({other} = ..)]"),
                ));
            }
        }

        let mut meta = Vec::default();

        for key in META_KEYS {
            if let Some(value) = single(&attributes, key, &field_name)? {
                meta.push(meta_call(key, value, &field_name)?);
            }
        }

        Ok(Some(DeriveParameter {
            field_name,
            role: if embed {
                FieldRole::Embed
            } else {
                FieldRole::Field
            },
            meta,
        }))
    }
}

fn meta_call(key: &str, value: &DeriveValue, field_name: &syn::Ident) -> Result<MetaCall, syn::Error> {
    let expression: syn::Expr = syn::parse2(value.tokens.clone())?;

    let method = match (key, &expression) {
        (
            "short",
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Char(_),
                ..
            }),
        ) => format_ident!("short"),
        ("short", _) => {
            return Err(syn::Error::new(
                field_name.span(),
                format!(
                    "Invalid - `short` expects a char literal (ex: 'v'), found `{}`.",
                    value.tokens
                ),
            ));
        }
        (
            "callback",
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(_),
                ..
            }),
        ) => format_ident!("callback"),
        ("callback", syn::Expr::Path(_)) => format_ident!("callback_fn"),
        ("callback", _) => {
            return Err(syn::Error::new(
                field_name.span(),
                format!(
                    "Invalid - `callback` expects a name (ex: \"help\") or a function path, found `{}`.",
                    value.tokens
                ),
            ));
        }
        (key, _) => format_ident!("{key}"),
    };

    Ok(MetaCall {
        method,
        value: DeriveValue {
            tokens: expression.to_token_stream(),
        },
    })
}
