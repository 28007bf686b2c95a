use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, LitStr};

/// Derive macro for record destinations.
///
/// Generates `Target`, `Shaped`, `Record` and `RecordSlot` impls so the
/// struct can receive rows: each column is matched to a field by name
/// (case- and underscore-insensitive).
///
/// The struct must implement `Default` (the zero value used when the record
/// is allocated inside an `Option` or appended to a `Vec`), and every field
/// type must implement `Shaped`.
///
/// # Example
///
/// ```ignore
/// #[derive(Record, Default)]
/// pub struct Cocktail {
///     pub name: String,
///     pub based_on: Vec<String>,
///
///     #[column(rename = "img")]
///     pub image: Option<String>,
///
///     #[column(skip)]
///     pub cached: bool,
/// }
/// ```
///
/// Field attributes:
/// - `#[column(rename = "...")]`: match this name instead of the field ident.
/// - `#[column(skip)]`: the field is never written; a column naming it fails.
#[proc_macro_derive(Record, attributes(column))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Record only supports structs",
            ))
        }
    };

    let mut field_defs = Vec::new();
    let mut field_arms = Vec::new();

    for field in fields {
        let Some(attrs) = column_attrs(field)? else {
            continue;
        };
        let ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let column = attrs.rename.unwrap_or_else(|| ident.unraw().to_string());
        let ty = &field.ty;
        let index = field_defs.len();

        field_defs.push(quote! {
            ::rowmap_api::FieldDef::new(#column, <#ty as ::rowmap_api::Shaped>::shape())
        });
        field_arms.push(quote! {
            #index => ::core::option::Option::Some(::rowmap_api::Target::slot(&mut self.#ident)),
        });
    }

    let name_str = name.to_string();

    Ok(quote! {
        impl ::rowmap_api::Target for #name {
            fn slot(&mut self) -> ::rowmap_api::SlotMut<'_> {
                ::rowmap_api::SlotMut::Record(self)
            }
        }

        impl ::rowmap_api::Shaped for #name {
            fn shape() -> ::rowmap_api::Shape {
                ::rowmap_api::Shape::Record(<Self as ::rowmap_api::Record>::record_type())
            }
        }

        impl ::rowmap_api::Record for #name {
            fn record_type() -> ::rowmap_api::RecordType {
                ::rowmap_api::RecordType {
                    name: #name_str,
                    id: ::core::any::TypeId::of::<Self>(),
                    fields: || ::std::vec![#(#field_defs),*],
                }
            }
        }

        impl ::rowmap_api::RecordSlot for #name {
            fn record_type(&self) -> ::rowmap_api::RecordType {
                <Self as ::rowmap_api::Record>::record_type()
            }

            fn field(&mut self, index: usize) -> ::core::option::Option<::rowmap_api::SlotMut<'_>> {
                match index {
                    #(#field_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// Parsed `#[column(...)]` attributes of one field.
struct ColumnAttrs {
    rename: Option<String>,
}

/// `None` when the field carries `#[column(skip)]`.
fn column_attrs(field: &Field) -> Result<Option<ColumnAttrs>, syn::Error> {
    let mut rename: Option<String> = None;
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("column") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else {
                return Err(meta.error("unknown column attribute (expected 'rename' or 'skip')"));
            }
            Ok(())
        })?;
    }

    if skip {
        if rename.is_some() {
            return Err(syn::Error::new_spanned(
                field,
                "#[column(skip)] cannot be combined with rename",
            ));
        }
        return Ok(None);
    }
    Ok(Some(ColumnAttrs { rename }))
}
