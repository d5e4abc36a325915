extern crate proc_macro;

mod common;
mod migrate;

use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Declares a `static` migrator holding every migration found in a directory.
///
/// ```ignore
/// stepwise::migrator!(pub MIGRATOR, "migrations");
/// ```
///
/// Each `.rs` file of the directory (relative to `CARGO_MANIFEST_DIR`) is a
/// migration named after its file stem, and must define `up` and `down`
/// functions taking a `&mut Executor`. An optional `description` function
/// returning a `&'static str` is picked up as well.
#[proc_macro]
pub fn migrator(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as migrate::MigrateInput);
    match migrate::expand_migrator_from_lit_dir(input) {
        Ok(ts) => ts.into(),
        Err(e) => {
            if let Some(parse_err) = e.downcast_ref::<syn::Error>() {
                parse_err.to_compile_error().into()
            } else {
                let msg = e.to_string();
                quote!(::std::compile_error!(#msg)).into()
            }
        }
    }
}
