//! Procedural macro for registering gel builtin functions.
//!
//! Provides the `#[builtin]` attribute, which turns a plain Rust function
//! into a registered Lisp builtin without hand-writing the env-binding
//! boilerplate at every call site.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Parse `name = "..."`, `category = "..."` and the bare `contextual` flag
/// out of the attribute's token stream.
fn parse_builtin_args(attr_stream: TokenStream) -> (String, String, bool) {
    let attr_str = attr_stream.to_string();

    let mut name = String::new();
    let mut category = String::new();

    if let Some(start) = attr_str.find("name = \"") {
        let rest = &attr_str[start + 8..];
        if let Some(end) = rest.find('"') {
            name = rest[..end].to_string();
        }
    }

    if let Some(start) = attr_str.find("category = \"") {
        let rest = &attr_str[start + 12..];
        if let Some(end) = rest.find('"') {
            category = rest[..end].to_string();
        }
    }

    let contextual = attr_str.contains("contextual");

    (name, category, contextual)
}

/// Attribute macro for defining Lisp builtin functions.
///
/// `#[builtin(name = "+", category = "Numeric")]` wraps a plain function
/// `fn(&Value) -> Result<Value, LispError>` (or, with `contextual`, a function
/// `fn(&Value, &Environment, &Value) -> Result<Value, LispError>`) and emits a
/// `register_<fn>(env: &Environment)` that binds it into the environment under
/// the given Lisp name.
#[proc_macro_attribute]
pub fn builtin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let (lisp_name, _category, contextual) = parse_builtin_args(attr);

    let fn_name = func.sig.ident.clone();
    let name_to_use = if lisp_name.is_empty() {
        fn_name.to_string()
    } else {
        lisp_name
    };

    let register_fn_name = quote::format_ident!("register_{}", fn_name);

    let kind = if contextual {
        quote! { crate::value::BuiltinKind::Contextual(#fn_name) }
    } else {
        quote! { crate::value::BuiltinKind::Plain(#fn_name) }
    };

    let expanded = quote! {
        #func

        #[allow(dead_code)]
        pub fn #register_fn_name(env: &crate::env::Environment) {
            env.define_global(
                #name_to_use,
                crate::value::Value::new_builtin(#name_to_use, #kind),
            );
        }
    };

    TokenStream::from(expanded)
}
