use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, FnArg, Ident, ImplItem, ItemImpl, ReturnType, Signature, Type, Visibility,
};

/// Derives `mathexpr_rs::Bindings` from an inherent `impl` block.
///
/// Every `pub fn` without a receiver whose parameters and return type are all
/// `f64` becomes a function under its own name: up to three parameters map to
/// the fixed-arity `Function` variants, more to `Function::nary`. Every
/// `pub const NAME: f64` becomes a constant. Anything else in the block is
/// kept as written and not exported.
///
/// ```ignore
/// struct Geometry;
///
/// #[mathexpr_rs::bindings]
/// impl Geometry {
///     pub const TAU: f64 = std::f64::consts::TAU;
///
///     pub fn hypot(a: f64, b: f64) -> f64 {
///         a.hypot(b)
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn bindings(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);

    if let Some((_, path, _)) = &input.trait_ {
        return syn::Error::new_spanned(path, "#[bindings] expects an inherent impl block")
            .to_compile_error()
            .into();
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let mut functions = Vec::new();
    let mut constants = Vec::new();

    for item in &input.items {
        match item {
            ImplItem::Fn(method) if is_public(&method.vis) => {
                if let Some(arity) = numeric_arity(&method.sig) {
                    functions.push(function_entry(self_ty, &method.sig.ident, arity));
                }
            }
            ImplItem::Const(constant) if is_public(&constant.vis) && is_f64(&constant.ty) => {
                let ident = &constant.ident;
                let name = ident.to_string();
                constants.push(quote! { (#name, <#self_ty>::#ident) });
            }
            _ => {}
        }
    }

    let expanded = quote! {
        #input

        impl #impl_generics ::mathexpr_rs::Bindings for #self_ty #where_clause {
            fn functions(&self) -> ::std::vec::Vec<(&'static str, ::mathexpr_rs::Function)> {
                ::std::vec![#(#functions),*]
            }

            fn constants(&self) -> ::std::vec::Vec<(&'static str, f64)> {
                ::std::vec![#(#constants),*]
            }
        }
    };

    TokenStream::from(expanded)
}

fn is_public(vis: &Visibility) -> bool {
    matches!(vis, Visibility::Public(_))
}

fn is_f64(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path.qself.is_none() && type_path.path.is_ident("f64"),
        Type::Paren(paren) => is_f64(&paren.elem),
        _ => false,
    }
}

/// Parameter count of a plain `fn(f64, ..) -> f64`, or `None` for anything else.
fn numeric_arity(sig: &Signature) -> Option<usize> {
    if sig.asyncness.is_some() || sig.unsafety.is_some() || sig.variadic.is_some() {
        return None;
    }
    if !sig.generics.params.is_empty() {
        return None;
    }
    match &sig.output {
        ReturnType::Type(_, ty) if is_f64(ty) => {}
        _ => return None,
    }

    let mut arity = 0;
    for arg in &sig.inputs {
        match arg {
            FnArg::Typed(pat_type) if is_f64(&pat_type.ty) => arity += 1,
            _ => return None,
        }
    }
    Some(arity)
}

fn function_entry(self_ty: &Type, ident: &Ident, arity: usize) -> TokenStream2 {
    let name = ident.to_string();
    let function = match arity {
        0 => quote! { ::mathexpr_rs::Function::nullary(<#self_ty>::#ident) },
        1 => quote! { ::mathexpr_rs::Function::unary(<#self_ty>::#ident) },
        2 => quote! { ::mathexpr_rs::Function::binary(<#self_ty>::#ident) },
        3 => quote! { ::mathexpr_rs::Function::ternary(<#self_ty>::#ident) },
        _ => {
            let indices = 0..arity;
            quote! {
                ::mathexpr_rs::Function::nary(#arity, |args: &[f64]| {
                    <#self_ty>::#ident(#(args[#indices]),*)
                })
            }
        }
    };
    quote! { (#name, #function) }
}
