//! Attribute parsing for the tagwire derive macro.

use std::collections::HashSet;

use proc_macro2::Span;
use syn::{
    Attribute, DeriveInput, Expr, ExprLit, ExprUnary, Fields, GenericArgument, Ident, Lit,
    PathArguments, Result, Type, UnOp,
};

/// Parsed field attributes from #[tagwire(...)]
#[derive(Default)]
pub struct FieldAttrs {
    /// Field id on the wire (required unless skipped).
    pub id: Option<i16>,
    /// Wire/display name, defaults to the Rust ident.
    pub name: Option<String>,
    pub required: bool,
    /// Not on the wire; filled with `Default::default()` on decode.
    pub skip: bool,
}

impl FieldAttrs {
    /// Parse attributes from a field.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = FieldAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("tagwire") {
                result.parse_tagwire_attr(attr)?;
            }
        }

        Ok(result)
    }

    fn parse_tagwire_attr(&mut self, attr: &Attribute) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let value: Expr = meta.value()?.parse()?;
                self.id = Some(parse_id(&value)?);
            } else if meta.path.is_ident("name") {
                let value: Expr = meta.value()?.parse()?;
                self.name = Some(parse_str(&value)?);
            } else if meta.path.is_ident("required") {
                self.required = true;
            } else if meta.path.is_ident("skip") {
                self.skip = true;
            } else {
                return Err(syn::Error::new_spanned(
                    meta.path,
                    "unknown tagwire attribute",
                ));
            }
            Ok(())
        })
    }
}

/// Parsed struct-level attributes.
#[derive(Default)]
pub struct StructAttrs {
    /// Custom type name (defaults to struct name).
    pub name: Option<String>,
    /// Also implement `std::error::Error`.
    pub exception: bool,
}

impl StructAttrs {
    /// Parse attributes from a struct.
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut result = StructAttrs::default();

        for attr in attrs {
            if attr.path().is_ident("tagwire") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value: Expr = meta.value()?.parse()?;
                        result.name = Some(parse_str(&value)?);
                        Ok(())
                    } else if meta.path.is_ident("exception") {
                        result.exception = true;
                        Ok(())
                    } else {
                        Err(syn::Error::new_spanned(
                            meta.path,
                            "unknown tagwire attribute",
                        ))
                    }
                })?;
            }
        }

        Ok(result)
    }
}

fn parse_id(value: &Expr) -> Result<i16> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match expr.as_ref() {
            Expr::Lit(ExprLit {
                lit: Lit::Int(lit), ..
            }) => {
                let magnitude: i32 = lit.base10_parse()?;
                i16::try_from(-magnitude)
                    .map_err(|_| syn::Error::new_spanned(value, "field id out of i16 range"))
            }
            _ => Err(syn::Error::new_spanned(value, "expected integer literal")),
        },
        _ => Err(syn::Error::new_spanned(value, "expected integer literal")),
    }
}

fn parse_str(value: &Expr) -> Result<String> {
    if let Expr::Lit(ExprLit {
        lit: Lit::Str(lit), ..
    }) = value
    {
        Ok(lit.value())
    } else {
        Err(syn::Error::new_spanned(value, "expected string literal"))
    }
}

/// One wire field of the struct.
pub struct FieldInfo {
    pub ident: Ident,
    pub id: i16,
    pub wire_name: String,
    /// `T` out of the field's `Option<T>`.
    pub inner_ty: Type,
    pub required: bool,
    pub span: Span,
}

/// Everything the generators need, collected from the derive input.
pub struct StructInfo {
    pub ident: Ident,
    pub wire_name: String,
    /// Wire fields in declaration order.
    pub fields: Vec<FieldInfo>,
    /// `#[tagwire(skip)]` fields.
    pub skipped: Vec<Ident>,
    pub exception: bool,
}

impl StructInfo {
    pub fn from_input(input: &DeriveInput) -> Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "TStruct does not support generic structs",
            ));
        }
        let struct_attrs = StructAttrs::from_attrs(&input.attrs)?;

        let named = match &input.data {
            syn::Data::Struct(data) => match &data.fields {
                Fields::Named(fields) => &fields.named,
                _ => {
                    return Err(syn::Error::new_spanned(
                        input,
                        "TStruct only supports structs with named fields",
                    ))
                }
            },
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "TStruct only supports structs",
                ))
            }
        };

        let mut fields = Vec::new();
        let mut skipped = Vec::new();
        for field in named {
            let Some(ident) = field.ident.clone() else {
                continue;
            };
            let attrs = FieldAttrs::from_attrs(&field.attrs)?;
            if attrs.skip {
                skipped.push(ident);
                continue;
            }

            let id = attrs.id.ok_or_else(|| {
                syn::Error::new_spanned(&ident, "field must have #[tagwire(id = N)] attribute")
            })?;
            let inner_ty = option_inner(&field.ty).cloned().ok_or_else(|| {
                syn::Error::new_spanned(&field.ty, "wire fields must be declared as Option<T>")
            })?;

            fields.push(FieldInfo {
                wire_name: attrs.name.unwrap_or_else(|| ident.to_string()),
                span: ident.span(),
                ident,
                id,
                inner_ty,
                required: attrs.required,
            });
        }

        validate_fields(&fields)?;

        Ok(StructInfo {
            wire_name: struct_attrs
                .name
                .unwrap_or_else(|| input.ident.to_string()),
            ident: input.ident.clone(),
            fields,
            skipped,
            exception: struct_attrs.exception,
        })
    }
}

/// Validate that ids and wire names are unique.
fn validate_fields(fields: &[FieldInfo]) -> Result<()> {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    for field in fields {
        if !seen_ids.insert(field.id) {
            return Err(syn::Error::new(
                field.span,
                format!("duplicate field id {} in struct", field.id),
            ));
        }
        if !seen_names.insert(field.wire_name.as_str()) {
            return Err(syn::Error::new(
                field.span,
                format!("duplicate field name '{}' in struct", field.wire_name),
            ));
        }
    }

    Ok(())
}

/// The `T` of an `Option<T>` type, matched by the last path segment.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
