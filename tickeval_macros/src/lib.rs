use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ItemFn, PatType, Type};

/// `abs` -> `Abs`, `moving_avg` -> `MovingAvg`
fn struct_name(fn_name: &str) -> String {
    fn_name
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Turns a plain function over typed arguments into a stateless `Function`.
///
/// The generated unit struct is named after the function in CamelCase, or
/// after the identifier given as the attribute argument (`#[tick_fn(Max)]`).
/// `Value`, `Function` and `FunctionError` must be in scope at the use site.
///
/// Supported argument types: `f64`, `i64`, `bool`, `String`, `Duration` and
/// `Value` (passed through untouched). Kinds are matched strictly, an `Int`
/// is never accepted where an `f64` is declared.
#[proc_macro_attribute]
pub fn tick_fn(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    let vis = &input.vis;
    let fn_name = &input.sig.ident;
    let fn_args = &input.sig.inputs;
    let fn_body = &input.block;
    let fn_output = &input.sig.output;

    let struct_ident = if attr.is_empty() {
        Ident::new(&struct_name(&fn_name.to_string()), Span::call_site())
    } else {
        parse_macro_input!(attr as Ident)
    };

    let mut arg_extractions = Vec::new();
    let mut arg_names = Vec::new();

    for (i, arg) in fn_args.iter().enumerate() {
        if let FnArg::Typed(PatType { pat, ty, .. }) = arg {
            let arg_name = match **pat {
                syn::Pat::Ident(ref ident) => &ident.ident,
                _ => panic!("Unsupported pattern"),
            };

            let extract_code = match **ty {
                Type::Path(ref type_path) => {
                    let type_ident = &type_path.path.segments.last().unwrap().ident;
                    let (pattern, expected) = match type_ident.to_string().as_str() {
                        "f64" => (quote! { Value::Float(n) => *n }, "float"),
                        "i64" => (quote! { Value::Int(n) => *n }, "int"),
                        "bool" => (quote! { Value::Bool(b) => *b }, "bool"),
                        "String" => (quote! { Value::String(s) => s.clone() }, "string"),
                        "Duration" => (quote! { Value::Duration(d) => *d }, "duration"),
                        "Value" => {
                            arg_extractions.push(quote! {
                                let #arg_name = args[#i].clone();
                            });
                            arg_names.push(arg_name.clone());
                            continue;
                        }
                        _ => panic!("Unsupported type {}", type_ident),
                    };
                    quote! {
                        let #arg_name = match &args[#i] {
                            #pattern,
                            other => {
                                return Err(FunctionError::InvalidArgument {
                                    position: #i,
                                    expected: #expected,
                                    got: other.kind(),
                                })
                            }
                        };
                    }
                }
                _ => panic!("Unsupported argument type"),
            };

            arg_extractions.push(extract_code);
            arg_names.push(arg_name.clone());
        }
    }

    let args_len = arg_names.len();
    let doc = format!("Generated from `{}`.", fn_name);
    let expanded = quote! {
        #[doc = #doc]
        #[derive(Debug, Default, Clone, Copy)]
        #vis struct #struct_ident;

        impl Function for #struct_ident {
            fn call(&mut self, args: &[Value]) #fn_output {
                if args.len() != #args_len {
                    return Err(FunctionError::WrongArgCount {
                        expected: #args_len,
                        got: args.len(),
                    });
                }

                #(#arg_extractions)*

                #fn_body
            }

            fn reset(&mut self) {}
        }
    };

    TokenStream::from(expanded)
}
