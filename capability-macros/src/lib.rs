//! Procedural macros for capability definitions.
//!
//! The `#[capability]` attribute inspects an annotated function's signature
//! and doc comments and emits a companion `<name>_capability()` constructor
//! returning a ready `CapabilityDescriptor`. It is a convenience layered on
//! top of the descriptor builder, which remains the primary construction
//! path; explicit attribute arguments always replace the inferred name,
//! description, or schema, never merge with them.

#![warn(missing_docs, clippy::pedantic)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{
    Expr, ExprLit, FnArg, GenericArgument, Ident, ItemFn, Lit, LitStr, Meta, Pat, PathArguments,
    Token, Type, parse_macro_input,
};

/// Wraps a free function as a capability.
///
/// Emits a `pub fn <name>_capability()` constructor next to the untouched
/// function. The capability name defaults to the function identifier, the
/// description to its doc comments (or a generated fallback when absent),
/// and the parameter schema to one field per typed parameter: `Option<T>`
/// marks a field optional, `default(param = value)` marks it optional with
/// that default, and unmappable parameter types fall back to the
/// unconstrained type so wrapping never fails on an annotation.
///
/// Supported arguments, each fully replacing the inferred value:
/// `name = "..."`, `description = "..."`, `schema = path` (a function
/// returning a `ParamSchema`), and `default(param = value, ...)`.
///
/// Generated bindings name the `capability-primitives` crate, which must be
/// a direct dependency of the annotated function's crate. Wrapped functions
/// return a plain `serde::Serialize` value; fallible handlers construct
/// their descriptor through the builder instead.
#[proc_macro_attribute]
pub fn capability(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as CapabilityArgs);
    let func = parse_macro_input!(item as ItemFn);
    let expanded = match expand(args, &func) {
        Ok(expanded) => expanded,
        Err(err) => err.to_compile_error(),
    };
    TokenStream::from(quote! {
        #func
        #expanded
    })
}

#[derive(Default)]
struct CapabilityArgs {
    name: Option<LitStr>,
    description: Option<LitStr>,
    schema: Option<syn::Path>,
    defaults: Vec<(Ident, Expr)>,
}

impl Parse for CapabilityArgs {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        let mut args = Self::default();
        let metas = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;
        for meta in metas {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    args.name = Some(string_literal(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("description") => {
                    args.description = Some(string_literal(&nv.value)?);
                }
                Meta::NameValue(nv) if nv.path.is_ident("schema") => {
                    if let Expr::Path(path) = nv.value {
                        args.schema = Some(path.path);
                    } else {
                        return Err(syn::Error::new_spanned(
                            nv.value,
                            "expected a path to a function returning `ParamSchema`",
                        ));
                    }
                }
                Meta::List(list) if list.path.is_ident("default") => {
                    let pairs =
                        list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
                    for pair in pairs {
                        let Meta::NameValue(nv) = pair else {
                            return Err(syn::Error::new_spanned(
                                pair,
                                "expected `param = value` inside `default(...)`",
                            ));
                        };
                        let ident = nv.path.require_ident()?.clone();
                        args.defaults.push((ident, nv.value));
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unsupported `capability` argument; expected `name`, `description`, \
                         `schema`, or `default(...)`",
                    ));
                }
            }
        }
        Ok(args)
    }
}

fn string_literal(expr: &Expr) -> syn::Result<LitStr> {
    if let Expr::Lit(ExprLit {
        lit: Lit::Str(lit), ..
    }) = expr
    {
        Ok(lit.clone())
    } else {
        Err(syn::Error::new_spanned(expr, "expected a string literal"))
    }
}

struct ParamSpec {
    ident: Ident,
    ty: Type,
    kind: TokenStream2,
    optional: bool,
    default: Option<Expr>,
}

fn expand(args: CapabilityArgs, func: &ItemFn) -> syn::Result<TokenStream2> {
    if !func.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &func.sig.generics,
            "`#[capability]` does not support generic functions",
        ));
    }

    let fn_ident = &func.sig.ident;
    let is_async = func.sig.asyncness.is_some();
    let vis = &func.vis;

    let capability_name = args
        .name
        .as_ref()
        .map_or_else(|| fn_ident.to_string(), LitStr::value);
    let description = args.description.as_ref().map_or_else(
        || doc_description(&func.attrs).unwrap_or_else(|| format!("Execute {fn_ident}")),
        LitStr::value,
    );

    let mut defaults = args.defaults;
    let mut params = Vec::new();
    for input in &func.sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "`#[capability]` supports free functions only",
                ));
            }
            FnArg::Typed(pat_type) => {
                let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
                    return Err(syn::Error::new_spanned(
                        &pat_type.pat,
                        "capability parameters must be plain identifiers",
                    ));
                };
                let ident = pat_ident.ident.clone();
                let ty = pat_type.ty.as_ref().clone();
                let (kind, optional) = param_kind(&ty);
                let default = take_default(&mut defaults, &ident);
                params.push(ParamSpec {
                    ident,
                    ty,
                    kind,
                    optional,
                    default,
                });
            }
        }
    }

    if let Some((ident, _)) = defaults.first() {
        return Err(syn::Error::new(
            ident.span(),
            format!("`default({ident} = ...)` does not match any parameter"),
        ));
    }

    let schema_expr = if let Some(path) = &args.schema {
        quote! { #path() }
    } else {
        let mut pieces = Vec::new();
        for param in &params {
            let name = param.ident.to_string();
            let kind = &param.kind;
            if let Some(default) = &param.default {
                pieces.push(quote! {
                    .optional(#name, #kind, ::capability_primitives::json!(#default))
                });
            } else if param.optional {
                pieces.push(quote! {
                    .field(::capability_primitives::ParamField::optional_without_default(
                        #name, #kind,
                    ))
                });
            } else {
                pieces.push(quote! { .required(#name, #kind) });
            }
        }
        quote! { ::capability_primitives::ParamSchema::builder() #(#pieces)* .build()? }
    };

    let extracts: Vec<TokenStream2> = params
        .iter()
        .map(|param| {
            let ident = &param.ident;
            let ty = &param.ty;
            let name = ident.to_string();
            if param.optional && param.default.is_none() {
                quote! {
                    let #ident: #ty = ::capability_primitives::extract_optional_arg(&args, #name)?;
                }
            } else {
                quote! {
                    let #ident: #ty = ::capability_primitives::extract_arg(&args, #name)?;
                }
            }
        })
        .collect();

    let arg_idents: Vec<&Ident> = params.iter().map(|param| &param.ident).collect();
    let call = quote! { #fn_ident(#(#arg_idents),*) };
    let args_pat = if params.is_empty() {
        quote!(_args)
    } else {
        quote!(args)
    };
    let handler_expr = if is_async {
        quote! {
            ::capability_primitives::Handler::from_async(
                |#args_pat: ::capability_primitives::Arguments| async move {
                    #(#extracts)*
                    ::capability_primitives::into_value(#call.await)
                },
            )
        }
    } else {
        quote! {
            ::capability_primitives::Handler::from_sync(
                |#args_pat: ::capability_primitives::Arguments| {
                    #(#extracts)*
                    ::capability_primitives::into_value(#call)
                },
            )
        }
    };

    let ctor_ident = format_ident!("{}_capability", fn_ident);
    let ctor_doc = format!("Builds the `{capability_name}` capability descriptor for registration.");
    Ok(quote! {
        #[doc = #ctor_doc]
        #vis fn #ctor_ident()
        -> ::capability_primitives::Result<::capability_primitives::CapabilityDescriptor> {
            let schema = #schema_expr;
            ::capability_primitives::CapabilityDescriptor::builder(#capability_name)
                .description(#description)
                .schema(schema)
                .handler(#handler_expr)
                .build()
        }
    })
}

fn take_default(defaults: &mut Vec<(Ident, Expr)>, ident: &Ident) -> Option<Expr> {
    let position = defaults.iter().position(|(name, _)| name == ident)?;
    Some(defaults.remove(position).1)
}

/// Maps a parameter type to its schema constraint, unwrapping `Option<T>`
/// into an optional field constrained by `T`.
fn param_kind(ty: &Type) -> (TokenStream2, bool) {
    if let Some(inner) = option_inner(ty) {
        return (base_kind(inner), true);
    }
    (base_kind(ty), false)
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    arguments.args.iter().find_map(|argument| match argument {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    })
}

fn base_kind(ty: &Type) -> TokenStream2 {
    let kind = match ty {
        Type::Reference(reference) => return base_kind(&reference.elem),
        Type::Path(type_path) => match type_path.path.segments.last() {
            Some(segment) => match segment.ident.to_string().as_str() {
                "String" | "str" | "char" => "Text",
                "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
                    "Integer"
                }
                "f32" | "f64" => "Number",
                "bool" => "Boolean",
                "Vec" => "Array",
                "HashMap" | "BTreeMap" | "Map" => "Object",
                // Unknown types stay unconstrained so wrapping never fails;
                // the handler's deserialization enforces the real shape.
                _ => "Any",
            },
            None => "Any",
        },
        _ => "Any",
    };
    let ident = format_ident!("{kind}");
    quote!(::capability_primitives::ParamType::#ident)
}

fn doc_description(attrs: &[syn::Attribute]) -> Option<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let Meta::NameValue(nv) = &attr.meta {
            if let Expr::Lit(ExprLit {
                lit: Lit::Str(lit), ..
            }) = &nv.value
            {
                lines.push(lit.value().trim().to_owned());
            }
        }
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    while lines.first().is_some_and(String::is_empty) {
        lines.remove(0);
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
