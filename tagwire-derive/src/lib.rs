//! Derive macro for tagwire typed structs.
//!
//! `#[derive(TStruct)]` generates a per-type codec plus presence-aware value
//! semantics, with no runtime schema lookup.
//!
//! # Example
//!
//! ```rust,ignore
//! use tagwire::TStruct;
//!
//! #[derive(TStruct, Debug, Clone, Default)]
//! #[tagwire(name = "Person")]
//! struct Person {
//!     #[tagwire(id = 1, required)]
//!     name: Option<String>,
//!     #[tagwire(id = 2)]
//!     age: Option<i32>,
//!     #[tagwire(skip)]
//!     cache: Vec<u8>,
//! }
//!
//! let person = Person { name: Some("Alice".into()), age: None, ..Default::default() };
//! let bytes = person.to_bytes().unwrap();
//! let decoded = Person::from_bytes(&bytes).unwrap();
//! assert_eq!(person, decoded);
//! assert_eq!(decoded.to_string(), r#"Person(name: "Alice")"#);
//! ```

mod attr;
mod decode;
mod encode;
mod semantics;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use crate::attr::StructInfo;

/// Derive macro generating `TStruct`, `WireValue`, `Presence`, `PartialEq`,
/// `Eq`, `Hash` and `Display`.
///
/// # Attributes
///
/// - `#[tagwire(id = N)]` - Required on each wire field, the field id (i16).
/// - `#[tagwire(name = "...")]` - Optional, wire/display name of a field or of the struct.
/// - `#[tagwire(required)]` - Optional, checked by `TStruct::validate` only.
/// - `#[tagwire(skip)]` - Optional, keep the field off the wire (uses Default on decode).
/// - `#[tagwire(exception)]` - Optional, on the struct: also implement `std::error::Error`
///   (the struct must derive `Debug`).
///
/// Every wire field must be an `Option<T>` with `T: WireValue`.
#[proc_macro_derive(TStruct, attributes(tagwire))]
pub fn derive_tstruct(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let info = StructInfo::from_input(input)?;
    let name = &info.ident;
    let type_name = &info.wire_name;

    let descriptor = encode::descriptor_fn(&info);
    let read = decode::read_fn(&info);
    let write = encode::write_fn(&info);
    let presence = semantics::presence_impl(&info);
    let eq = semantics::eq_impl(&info);
    let hash = semantics::hash_impl(&info);
    let display = semantics::display_impl(&info);
    let wire_value = semantics::wire_value_impl(&info);
    let error = semantics::error_impl(&info);

    Ok(quote! {
        impl ::tagwire::TStruct for #name {
            const NAME: &'static str = #type_name;

            #descriptor

            #read

            #write
        }

        #presence
        #eq
        #hash
        #display
        #wire_value
        #error
    })
}
