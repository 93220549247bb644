// Containers are the only compound SSZ types that need per-type code.
// Everything else is implemented generically in the `ssz` crate.

use darling::FromDeriveInput as _;
use proc_macro::TokenStream;
use syn::{Error, parse_macro_input};

use crate::ssz_type::SszType;

mod ssz_field;
mod ssz_type;

#[proc_macro_derive(Ssz, attributes(ssz))]
pub fn derive(input: TokenStream) -> TokenStream {
    match SszType::from_derive_input(&parse_macro_input!(input)) {
        Ok(ssz_type) => ssz_type.impls().unwrap_or_else(Error::into_compile_error),
        Err(error) => error.write_errors(),
    }
    .into()
}
