//! Presence, equality, hashing, display and nesting impls.
//!
//! All of them look at present fields only; skipped fields take no part.

use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::StructInfo;

pub fn presence_impl(info: &StructInfo) -> TokenStream {
    let name = &info.ident;
    let ids: Vec<_> = info.fields.iter().map(|f| f.id).collect();
    let idents: Vec<_> = info.fields.iter().map(|f| &f.ident).collect();

    quote! {
        impl ::tagwire::Presence for #name {
            fn is_set(&self, id: i16) -> bool {
                match id {
                    #( #ids => self.#idents.is_some(), )*
                    _ => false,
                }
            }

            fn clear(&mut self, id: i16) -> bool {
                match id {
                    #( #ids => self.#idents.take().is_some(), )*
                    _ => false,
                }
            }

            #[allow(unused_mut)]
            fn present_ids(&self) -> ::std::vec::Vec<i16> {
                let mut present = ::std::vec::Vec::new();
                #(
                    if self.#idents.is_some() {
                        present.push(#ids);
                    }
                )*
                present
            }
        }
    }
}

pub fn eq_impl(info: &StructInfo) -> TokenStream {
    let name = &info.ident;
    let compares = info.fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.inner_ty;
        quote! {
            && match (&self.#ident, &other.#ident) {
                (::std::option::Option::Some(a), ::std::option::Option::Some(b)) => {
                    <#ty as ::tagwire::WireValue>::wire_eq(a, b)
                }
                (::std::option::Option::None, ::std::option::Option::None) => true,
                _ => false,
            }
        }
    });

    quote! {
        impl ::std::cmp::PartialEq for #name {
            #[allow(unused_variables)]
            fn eq(&self, other: &Self) -> bool {
                true #(#compares)*
            }
        }

        impl ::std::cmp::Eq for #name {}
    }
}

pub fn hash_impl(info: &StructInfo) -> TokenStream {
    let name = &info.ident;
    let folds = info.fields.iter().map(|field| {
        let ident = &field.ident;
        let id = field.id;
        let ty = &field.inner_ty;
        quote! {
            if let ::std::option::Option::Some(v) = &self.#ident {
                ::std::hash::Hash::hash(&#id, state);
                <#ty as ::tagwire::WireValue>::wire_hash(v, state);
            }
        }
    });

    quote! {
        impl ::std::hash::Hash for #name {
            #[allow(unused_variables)]
            fn hash<__H: ::std::hash::Hasher>(&self, state: &mut __H) {
                #(#folds)*
            }
        }
    }
}

pub fn display_impl(info: &StructInfo) -> TokenStream {
    let name = &info.ident;
    let type_name = &info.wire_name;
    let entries = info.fields.iter().map(|field| {
        let ident = &field.ident;
        let wire_name = &field.wire_name;
        let ty = &field.inner_ty;
        quote! {
            if let ::std::option::Option::Some(v) = &self.#ident {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                f.write_str(#wire_name)?;
                f.write_str(": ")?;
                <#ty as ::tagwire::WireValue>::wire_fmt(v, f)?;
            }
        }
    });

    quote! {
        impl ::std::fmt::Display for #name {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(#type_name)?;
                f.write_str("(")?;
                let mut first = true;
                #(#entries)*
                f.write_str(")")
            }
        }
    }
}

/// `impl Error` for `#[tagwire(exception)]` structs, on top of the generated `Display`.
pub fn error_impl(info: &StructInfo) -> TokenStream {
    if !info.exception {
        return TokenStream::new();
    }
    let name = &info.ident;
    quote! {
        impl ::std::error::Error for #name {}
    }
}

/// Lets the struct appear as a field (or container element) of other structs.
pub fn wire_value_impl(info: &StructInfo) -> TokenStream {
    let name = &info.ident;

    quote! {
        impl ::tagwire::WireValue for #name {
            const WIRE_TYPE: ::tagwire::types::WireType = ::tagwire::types::WireType::Struct;

            fn field_type() -> ::tagwire::types::FieldType {
                ::tagwire::types::FieldType::Struct(
                    <Self as ::tagwire::TStruct>::NAME.to_string(),
                )
            }

            fn read_wire<__R: ::tagwire::protocol::ProtocolReader + ?Sized>(
                iprot: &mut __R,
            ) -> ::std::result::Result<::std::option::Option<Self>, ::tagwire::CodecError> {
                <Self as ::tagwire::TStruct>::read(iprot).map(::std::option::Option::Some)
            }

            fn write_wire<__W: ::tagwire::protocol::ProtocolWriter + ?Sized>(
                &self,
                oprot: &mut __W,
            ) -> ::std::result::Result<(), ::tagwire::CodecError> {
                <Self as ::tagwire::TStruct>::write(self, oprot)
            }

            fn wire_eq(&self, other: &Self) -> bool {
                self == other
            }

            fn wire_hash<__H: ::std::hash::Hasher>(&self, state: &mut __H) {
                ::std::hash::Hash::hash(self, state)
            }

            fn wire_fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(self, f)
            }
        }
    }
}
