//! Code generation for `TStruct::read`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::attr::StructInfo;

pub fn read_fn(info: &StructInfo) -> TokenStream {
    let type_name = &info.wire_name;
    let locals: Vec<_> = info
        .fields
        .iter()
        .map(|f| format_ident!("__tagwire_{}", f.ident))
        .collect();
    let idents = info.fields.iter().map(|f| &f.ident);
    let tys: Vec<_> = info.fields.iter().map(|f| &f.inner_ty).collect();
    let skipped = &info.skipped;

    let arms = info.fields.iter().zip(&locals).map(|(field, local)| {
        let id = field.id;
        let ty = &field.inner_ty;
        quote! {
            #id if header.wire_type == <#ty as ::tagwire::WireValue>::WIRE_TYPE => {
                if let ::std::option::Option::Some(v) =
                    <#ty as ::tagwire::WireValue>::read_wire(&mut *iprot)?
                {
                    #local = ::std::option::Option::Some(v);
                }
            }
            #id => ::tagwire::codec::skip_field(
                &mut *iprot,
                #type_name,
                &header,
                ::std::option::Option::Some(<#ty as ::tagwire::WireValue>::WIRE_TYPE),
            )?,
        }
    });

    quote! {
        fn read<__R: ::tagwire::protocol::ProtocolReader + ?Sized>(
            iprot: &mut __R,
        ) -> ::std::result::Result<Self, ::tagwire::CodecError> {
            use ::tagwire::protocol::ProtocolReader as _;

            let mut iprot = ::tagwire::protocol::RecursionGuard::enter(iprot)?;
            iprot.read_struct_begin()?;

            #(
                let mut #locals: ::std::option::Option<#tys> = ::std::option::Option::None;
            )*

            loop {
                let header = iprot.read_field_begin()?;
                if header.is_stop() {
                    break;
                }
                match header.id {
                    #(#arms)*
                    _ => ::tagwire::codec::skip_field(
                        &mut *iprot,
                        #type_name,
                        &header,
                        ::std::option::Option::None,
                    )?,
                }
                iprot.read_field_end()?;
            }

            iprot.read_struct_end()?;
            ::std::result::Result::Ok(Self {
                #( #idents: #locals, )*
                #( #skipped: ::std::default::Default::default(), )*
            })
        }
    }
}
