use crate::model::{DeriveValue, IntermediateAttributes};

mod attribute;
mod parameter;
mod parser;

pub(crate) const ATTRIBUTE: &str = "fieldopt";

fn incompatible_error(
    field_name: &syn::Ident,
    left: impl Into<String>,
    right: impl Into<String>,
) -> syn::Error {
    syn::Error::new(
        field_name.span(),
        format!(
            "Invalid - field cannot be both `{}` and `{}`.",
            left.into(),
            right.into(),
        ),
    )
}

/// Merge every `#[fieldopt(..)]` among `attrs`.
fn collect_attributes(attrs: &[syn::Attribute]) -> Result<IntermediateAttributes, syn::Error> {
    let mut attributes = IntermediateAttributes::default();

    for attribute in attrs {
        if attribute.path().is_ident(ATTRIBUTE) {
            let IntermediateAttributes { singletons, pairs } =
                IntermediateAttributes::try_from(attribute)?;
            attributes.singletons.extend(singletons);

            for (key, values) in pairs {
                attributes.pairs.entry(key).or_default().extend(values);
            }
        }
    }

    Ok(attributes)
}

/// The value of the pair `key`, rejecting repetitions.
fn single<'a>(
    attributes: &'a IntermediateAttributes,
    key: &str,
    ident: &syn::Ident,
) -> Result<Option<&'a DeriveValue>, syn::Error> {
    match attributes.pairs.get(key).map(Vec::as_slice) {
        None | Some([]) => Ok(None),
        Some([value]) => Ok(Some(value)),
        Some(_) => Err(syn::Error::new(
            ident.span(),
            format!("Invalid - `{key}` may only be given once."),
        )),
    }
}

fn reject_unknown(
    attributes: &IntermediateAttributes,
    singletons: &[&str],
    pairs: &[&str],
    ident: &syn::Ident,
) -> Result<(), syn::Error> {
    let mut unknown: Vec<&String> = attributes
        .singletons
        .iter()
        .filter(|key| !singletons.contains(&key.as_str()))
        .chain(
            attributes
                .pairs
                .keys()
                .filter(|key| !pairs.contains(&key.as_str())),
        )
        .collect();
    unknown.sort();

    match unknown.first() {
        Some(key) => Err(syn::Error::new(
            ident.span(),
            format!("Invalid - unknown attribute `{key}`."),
        )),
        None => Ok(()),
    }
}
