// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Fields, FieldsNamed, GenericArgument,
    Ident, LitStr, PathArguments, Token, Type,
};

/// Evolution rule declared on a type
enum TransformAttr {
    Rename { from: String, to: String },
    EnumDefault { old: String, new: String },
}

/// Alternate constructor: `name(param: Type, ...)` calling `Self::name`
struct AltConstructor {
    func: Ident,
    params: Vec<TypedParam>,
}

struct TypedParam {
    name: Ident,
    ty: Type,
}

impl Parse for TypedParam {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![:]>()?;
        let ty = input.parse()?;
        Ok(Self { name, ty })
    }
}

#[derive(Default)]
struct TypeAttrs {
    name: Option<String>,
    provides: Vec<String>,
    trusted: bool,
    constructors: Vec<AltConstructor>,
    transforms: Vec<TransformAttr>,
}

#[derive(Default)]
struct FieldAttrs {
    default: Option<String>,
    requires: Vec<String>,
}

/// `#[derive(Wire)]` macro: generates the `typewire::Wire` descriptor table
///
/// Supports:
/// - Structs with named fields (composite): one property per field, read
///   back through a constructor taking every field in declared order
/// - Unit structs (singleton)
/// - Fieldless enums
///
/// `Option<T>` fields are nullable; `Vec<u8>` fields travel as binary.
///
/// Type attributes: `name = "..."`, `provides("...")`, `trusted`,
/// `rename(from = "..", to = "..")`, `enum_default(old = "..", new = "..")`,
/// `constructors(name(param: Type, ..), ..)`.
/// Field attributes: `default = "literal"`, `requires("...")`.
/// Variant attributes: `name = "..."`.
///
/// Example:
/// ```ignore
/// use typewire::Wire;
///
/// #[derive(Wire)]
/// #[wire(name = "demo.Order", rename(from = "qty", to = "quantity"))]
/// struct Order {
///     id: i64,
///     #[wire(default = "1")]
///     quantity: i32,
///     note: Option<String>,   // nullable
///     blob: Vec<u8>,          // binary
/// }
/// ```
#[proc_macro_derive(Wire, attributes(wire))]
pub fn derive_wire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(lifetime, "lifetime parameters are not supported"));
    }
    let attrs = parse_type_attrs(&input.attrs)?;
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_composite(input, &attrs, fields),
            Fields::Unit => expand_singleton(input, &attrs),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(input, "Only named fields are supported")),
        },
        Data::Enum(data) => expand_enum(input, &attrs, data),
        Data::Union(_) => Err(syn::Error::new_spanned(input, "Unions are not supported")),
    }
}

fn parse_type_attrs(attrs: &[Attribute]) -> syn::Result<TypeAttrs> {
    let mut out = TypeAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("wire")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                out.name = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("provides") {
                out.provides.extend(parse_str_list(&meta)?);
            } else if meta.path.is_ident("trusted") {
                out.trusted = true;
            } else if meta.path.is_ident("rename") {
                let (from, to) = parse_pair(&meta, "from", "to")?;
                out.transforms.push(TransformAttr::Rename { from, to });
            } else if meta.path.is_ident("enum_default") {
                let (old, new) = parse_pair(&meta, "old", "new")?;
                out.transforms.push(TransformAttr::EnumDefault { old, new });
            } else if meta.path.is_ident("constructors") {
                out.constructors.extend(parse_constructors(&meta)?);
            } else {
                return Err(meta.error("unsupported wire attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("wire")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                out.default = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("requires") {
                out.requires.extend(parse_str_list(&meta)?);
            } else {
                return Err(meta.error("unsupported wire field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

fn parse_variant_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut name = None;
    for attr in attrs.iter().filter(|a| a.path().is_ident("wire")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("unsupported wire variant attribute"))
            }
        })?;
    }
    Ok(name)
}

/// `key("a", "b")`
fn parse_str_list(meta: &ParseNestedMeta) -> syn::Result<Vec<String>> {
    let content;
    syn::parenthesized!(content in meta.input);
    let list = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
    Ok(list.iter().map(LitStr::value).collect())
}

/// `key(first = "..", second = "..")`
fn parse_pair(meta: &ParseNestedMeta, first: &str, second: &str) -> syn::Result<(String, String)> {
    let mut a = None;
    let mut b = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident(first) {
            a = Some(inner.value()?.parse::<LitStr>()?.value());
        } else if inner.path.is_ident(second) {
            b = Some(inner.value()?.parse::<LitStr>()?.value());
        } else {
            return Err(inner.error(format!("expected `{first}` or `{second}`")));
        }
        Ok(())
    })?;
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(meta.error(format!("expected `{first} = \"..\", {second} = \"..\"`"))),
    }
}

/// `constructors(legacy(id: i64, qty: i32), ...)`
fn parse_constructors(meta: &ParseNestedMeta) -> syn::Result<Vec<AltConstructor>> {
    let content;
    syn::parenthesized!(content in meta.input);
    let mut out = Vec::new();
    while !content.is_empty() {
        let func: Ident = content.parse()?;
        let args;
        syn::parenthesized!(args in content);
        let params = Punctuated::<TypedParam, Token![,]>::parse_terminated(&args)?;
        out.push(AltConstructor {
            func,
            params: params.into_iter().collect(),
        });
        if content.is_empty() {
            break;
        }
        content.parse::<Token![,]>()?;
    }
    Ok(out)
}

/// Inner type of `Option<T>`
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
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

fn is_byte_vec(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Vec" {
        return false;
    }
    if let PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(GenericArgument::Type(Type::Path(inner))) = args.args.first() {
            return inner.path.is_ident("u8");
        }
    }
    false
}

/// Type-parameter positions of a field type, emitted as `GenericMask`.
enum Mask {
    Concrete,
    Param,
    Args(Vec<Mask>),
}

/// Wrappers that add no structure of their own
const TRANSPARENT: [&str; 3] = ["Option", "Box", "Arc"];

fn generic_mask(ty: &Type, params: &[Ident]) -> Mask {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            if path
                .path
                .get_ident()
                .is_some_and(|ident| params.iter().any(|p| p == ident))
            {
                return Mask::Param;
            }
            let Some(segment) = path.path.segments.last() else {
                return Mask::Concrete;
            };
            let PathArguments::AngleBracketed(args) = &segment.arguments else {
                return Mask::Concrete;
            };
            let masks: Vec<Mask> = args
                .args
                .iter()
                .filter_map(|arg| match arg {
                    GenericArgument::Type(inner) => Some(generic_mask(inner, params)),
                    _ => None,
                })
                .collect();
            if masks.iter().all(|m| matches!(m, Mask::Concrete)) {
                Mask::Concrete
            } else if TRANSPARENT.iter().any(|w| segment.ident == *w) {
                masks.into_iter().next().unwrap_or(Mask::Concrete)
            } else {
                Mask::Args(masks)
            }
        }
        Type::Array(array) => match generic_mask(&array.elem, params) {
            Mask::Concrete => Mask::Concrete,
            elem => Mask::Args(vec![elem]),
        },
        Type::Paren(inner) => generic_mask(&inner.elem, params),
        _ => Mask::Concrete,
    }
}

fn mask_tokens(mask: &Mask) -> TokenStream2 {
    match mask {
        Mask::Concrete => quote! { ::typewire::model::GenericMask::Concrete },
        Mask::Param => quote! { ::typewire::model::GenericMask::Param },
        Mask::Args(args) => {
            let args = args.iter().map(mask_tokens);
            quote! { ::typewire::model::GenericMask::Args(::std::vec![#(#args),*]) }
        }
    }
}

fn type_ref(ty: &Type) -> TokenStream2 {
    if is_byte_vec(ty) {
        return quote! { ::typewire::model::TypeRef::binary() };
    }
    if option_inner(ty).is_some_and(is_byte_vec) {
        return quote! { ::typewire::model::TypeRef::optional_binary() };
    }
    quote! { ::typewire::model::TypeRef::of::<#ty>() }
}

/// Wire name expression; generic types append their arguments' names.
fn name_expr(input: &DeriveInput, attrs: &TypeAttrs) -> TokenStream2 {
    let base = match &attrs.name {
        Some(name) => quote! { ::std::string::String::from(#name) },
        None => {
            let ident = input.ident.to_string();
            quote! { ::std::format!("{}.{}", ::core::module_path!().replace("::", "."), #ident) }
        }
    };
    let params: Vec<&Ident> = input.generics.type_params().map(|p| &p.ident).collect();
    if params.is_empty() {
        return base;
    }
    quote! {
        {
            let args: ::std::vec::Vec<::std::string::String> =
                ::std::vec![#(<#params as ::typewire::Wire>::wire_name()),*];
            ::std::format!("{}<{}>", #base, args.join(","))
        }
    }
}

/// Builder calls shared by every shape
fn decorations(attrs: &TypeAttrs) -> TokenStream2 {
    let provides = &attrs.provides;
    let transforms = attrs.transforms.iter().map(|t| match t {
        TransformAttr::Rename { from, to } => quote! { ::typewire::schema::Transform::rename(#from, #to) },
        TransformAttr::EnumDefault { old, new } => {
            quote! { ::typewire::schema::Transform::enum_default(#old, #new) }
        }
    });
    let trusted = attrs.trusted.then(|| quote! { .trusted() });
    quote! {
        .with_provides(::std::vec![#(::std::string::String::from(#provides)),*])
        .with_transforms(::std::vec![#(#transforms),*])
        #trusted
    }
}

fn reject_generics(input: &DeriveInput, what: &str) -> syn::Result<()> {
    match input.generics.type_params().next() {
        Some(param) => Err(syn::Error::new_spanned(param, format!("generic {what} are not supported"))),
        None => Ok(()),
    }
}

fn expand_composite(input: &DeriveInput, attrs: &TypeAttrs, fields: &FieldsNamed) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let type_params: Vec<Ident> = input.generics.type_params().map(|p| p.ident.clone()).collect();

    let mut properties = Vec::new();
    let mut takes = Vec::new();
    let mut defaults = Vec::new();
    for field in &fields.named {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let field_attrs = parse_field_attrs(&field.attrs)?;
        let name_str = field_name.to_string();
        let ty = &field.ty;
        let ty_ref = type_ref(ty);
        let nullable = option_inner(ty).is_some();
        let generic = mask_tokens(&generic_mask(ty, &type_params));
        let default = field_attrs
            .default
            .as_ref()
            .map(|literal| quote! { .default_literal(#literal) });
        let requires = &field_attrs.requires;

        properties.push(quote! {
            ::typewire::model::Property::new(#name_str, #ty_ref, |value| {
                value
                    .downcast_ref::<Self>()
                    .map(|v| &v.#field_name as &dyn ::std::any::Any)
            })
            .nullable(#nullable)
            .generic(#generic)
            .requires(::std::vec![#(::std::string::String::from(#requires)),*])
            #default
        });
        takes.push(quote! { #field_name: args.take::<#ty>(#name_str)? });
        defaults.push((name_str, field_attrs.default));
    }

    let alternates = attrs.constructors.iter().map(|ctor| {
        let func = &ctor.func;
        let params = ctor.params.iter().map(|p| {
            let name_str = p.name.to_string();
            let ty_ref = type_ref(&p.ty);
            let nullable = option_inner(&p.ty).is_some();
            let default = defaults
                .iter()
                .find(|(name, _)| *name == name_str)
                .and_then(|(_, literal)| literal.as_ref())
                .map(|literal| quote! { .default_literal(#literal) });
            quote! {
                ::typewire::model::Param::new(#name_str, #ty_ref).nullable(#nullable) #default
            }
        });
        let args = ctor.params.iter().map(|p| {
            let name_str = p.name.to_string();
            let ty = &p.ty;
            quote! { args.take::<#ty>(#name_str)? }
        });
        quote! {
            ::typewire::model::Constructor::new(
                ::std::vec![#(#params),*],
                |args: &mut ::typewire::model::Args| -> ::core::result::Result<Self, ::std::string::String> {
                    ::core::result::Result::Ok(Self::#func(#(#args),*))
                },
            )
        }
    });

    let name = name_expr(input, attrs);
    let decorations = decorations(attrs);
    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::typewire::Wire));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::typewire::Wire for #ident #ty_generics #where_clause {
            fn local_type() -> ::typewire::model::LocalType {
                let properties: ::std::vec::Vec<::typewire::model::Property> = ::std::vec![#(#properties),*];
                let constructor = ::typewire::model::Constructor::from_properties(
                    &properties,
                    |args: &mut ::typewire::model::Args| -> ::core::result::Result<Self, ::std::string::String> {
                        ::core::result::Result::Ok(Self { #(#takes),* })
                    },
                );
                let alternates: ::std::vec::Vec<::typewire::model::Constructor> = ::std::vec![#(#alternates),*];
                ::typewire::model::LocalType::new(
                    <Self as ::typewire::Wire>::wire_name(),
                    ::typewire::model::TypeKey::of::<Self>(),
                    ::typewire::model::Shape::Composite(::typewire::model::CompositeShape {
                        properties,
                        constructor,
                        alternates,
                    }),
                )
                #decorations
            }

            fn wire_name() -> ::std::string::String {
                #name
            }
        }
    })
}

fn expand_singleton(input: &DeriveInput, attrs: &TypeAttrs) -> syn::Result<TokenStream2> {
    reject_generics(input, "singletons")?;
    let ident = &input.ident;
    let name = name_expr(input, attrs);
    let decorations = decorations(attrs);
    Ok(quote! {
        impl ::typewire::Wire for #ident {
            fn local_type() -> ::typewire::model::LocalType {
                ::typewire::model::LocalType::new(
                    <Self as ::typewire::Wire>::wire_name(),
                    ::typewire::model::TypeKey::of::<Self>(),
                    ::typewire::model::Shape::Singleton(::typewire::model::SingletonShape {
                        instance: ::std::sync::Arc::new(|| {
                            ::std::boxed::Box::new(#ident) as ::typewire::model::Object
                        }),
                    }),
                )
                #decorations
            }

            fn wire_name() -> ::std::string::String {
                #name
            }
        }
    })
}

fn expand_enum(input: &DeriveInput, attrs: &TypeAttrs, data: &DataEnum) -> syn::Result<TokenStream2> {
    reject_generics(input, "enums")?;
    let ident = &input.ident;

    let mut constants = Vec::new();
    let mut ordinal_arms = Vec::new();
    let mut from_arms = Vec::new();
    for (ordinal, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(variant, "Only fieldless enums are supported"));
        }
        let v = &variant.ident;
        constants.push(parse_variant_name(&variant.attrs)?.unwrap_or_else(|| v.to_string()));
        ordinal_arms.push(quote! { #ident::#v => #ordinal });
        from_arms.push(quote! {
            #ordinal => ::core::option::Option::Some(::std::boxed::Box::new(#ident::#v) as ::typewire::model::Object)
        });
    }

    let name = name_expr(input, attrs);
    let decorations = decorations(attrs);
    Ok(quote! {
        impl ::typewire::Wire for #ident {
            fn local_type() -> ::typewire::model::LocalType {
                let shape = ::typewire::model::EnumShape::new(
                    ::std::vec![#(::std::string::String::from(#constants)),*],
                    |value: &dyn ::std::any::Any| {
                        value.downcast_ref::<#ident>().map(|v| match v {
                            #(#ordinal_arms,)*
                        })
                    },
                    |ordinal: usize| match ordinal {
                        #(#from_arms,)*
                        _ => ::core::option::Option::None,
                    },
                );
                ::typewire::model::LocalType::new(
                    <Self as ::typewire::Wire>::wire_name(),
                    ::typewire::model::TypeKey::of::<Self>(),
                    ::typewire::model::Shape::Enum(shape),
                )
                #decorations
            }

            fn wire_name() -> ::std::string::String {
                #name
            }
        }
    })
}
