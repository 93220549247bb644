use darling::FromField;
use syn::{parse_quote, ExprPath, Ident, Path, Type};

#[derive(FromField)]
#[darling(attributes(ssz))]
pub struct SszField {
    pub ident: Option<Ident>,
    pub ty: Type,

    // Excluded from serialization and hashing entirely. Used for caches.
    #[darling(default)]
    pub skip: bool,
    // Included in serialization and `hash_tree_root` but left out of `signed_root`.
    #[darling(default)]
    pub signature: bool,
}

impl SszField {
    pub fn size_expr(&self, ssz: &Path) -> ExprPath {
        let ty = &self.ty;
        parse_quote! { <#ty as #ssz::SszSize>::SIZE }
    }
}
