//! Code generation for `TStruct::write` and `TStruct::descriptor`.

use proc_macro2::TokenStream;
use quote::quote;

use crate::attr::StructInfo;

pub fn write_fn(info: &StructInfo) -> TokenStream {
    let type_name = &info.wire_name;

    // declared order, present fields only
    let writes = info.fields.iter().map(|field| {
        let ident = &field.ident;
        let id = field.id;
        let name = &field.wire_name;
        let ty = &field.inner_ty;
        quote! {
            if let ::std::option::Option::Some(v) = &self.#ident {
                oprot.write_field_begin(#name, <#ty as ::tagwire::WireValue>::WIRE_TYPE, #id)?;
                <#ty as ::tagwire::WireValue>::write_wire(v, &mut *oprot)?;
                oprot.write_field_end()?;
            }
        }
    });

    quote! {
        fn write<__W: ::tagwire::protocol::ProtocolWriter + ?Sized>(
            &self,
            oprot: &mut __W,
        ) -> ::std::result::Result<(), ::tagwire::CodecError> {
            use ::tagwire::protocol::ProtocolWriter as _;

            let mut oprot = ::tagwire::protocol::RecursionGuard::enter(oprot)?;
            oprot.write_struct_begin(#type_name)?;
            #(#writes)*
            oprot.write_field_stop()?;
            oprot.write_struct_end()
        }
    }
}

pub fn descriptor_fn(info: &StructInfo) -> TokenStream {
    let type_name = &info.wire_name;
    let fields = info.fields.iter().map(|field| {
        let id = field.id;
        let name = &field.wire_name;
        let ty = &field.inner_ty;
        let required = field.required;
        quote! {
            .with_field(
                ::tagwire::types::FieldDescriptor::new(
                    #id,
                    #name,
                    <#ty as ::tagwire::WireValue>::field_type(),
                )
                .required(#required),
            )
        }
    });

    quote! {
        fn descriptor() -> ::tagwire::types::StructDescriptor {
            ::tagwire::types::StructDescriptor::new(#type_name)
                #(#fields)*
        }
    }
}
