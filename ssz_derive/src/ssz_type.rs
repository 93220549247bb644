use std::borrow::Cow;

use darling::{ast::Data, FromDeriveInput};
use easy_ext::ext;
use itertools::Itertools as _;
use proc_macro2::{Span, TokenStream};
use proc_macro_crate::FoundCrate;
use quote::{format_ident, quote, TokenStreamExt as _};
use syn::{
    parse_quote,
    punctuated::Punctuated,
    token::{Comma, Where},
    Error, Expr, Generics, Ident, ImplGenerics, ImplItemFn, ImplItemType, Member, Path,
    TypeGenerics, WhereClause, WherePredicate,
};

use crate::ssz_field::SszField;

#[derive(FromDeriveInput)]
#[darling(attributes(ssz))]
pub struct SszType {
    ident: Ident,
    generics: Generics,
    data: Data<(), SszField>,

    // Replaces the where clause of the type in all generated impls.
    bound: Option<Punctuated<WherePredicate, Comma>>,
    #[darling(default = "default_to_true")]
    derive_hash: bool,
    #[darling(default = "default_to_true")]
    derive_size: bool,
    #[darling(default = "default_to_true")]
    derive_write: bool,
    // Needed to derive impls inside the `ssz` crate itself.
    #[darling(default)]
    internal: bool,
    // Newtype structs marked with this delegate everything to the wrapped field.
    #[darling(default)]
    transparent: bool,
}

impl SszType {
    pub fn impls(&self) -> Result<TokenStream, Error> {
        self.validate()?;

        let (impl_generics, ty_generics, where_clause) = self.split_for_impl();
        let ssz = self.ssz_path()?;
        let ident = &self.ident;

        let mut impls = quote! {};

        if self.derive_size {
            let size_expr = self.size_expr(&ssz)?;

            impls.append_all(quote! {
                impl #impl_generics #ssz::SszSize for #ident #ty_generics #where_clause {
                    const SIZE: #ssz::Size = #size_expr;
                }
            });
        }

        if self.derive_write {
            let write_fixed_fn_impl = self.write_fixed_fn_impl(&ssz)?;
            let write_variable_fn_impl = self.write_variable_fn_impl(&ssz)?;

            impls.append_all(quote! {
                impl #impl_generics #ssz::SszWrite for #ident #ty_generics #where_clause {
                    #write_fixed_fn_impl

                    #write_variable_fn_impl
                }
            });
        }

        if self.derive_hash {
            let packing_factor_type_impl = self.packing_factor_type_impl(&ssz)?;
            let hash_tree_root_fn_impl = self.hash_tree_root_fn_impl(&ssz)?;

            impls.append_all(quote! {
                impl #impl_generics #ssz::SszHash for #ident #ty_generics #where_clause {
                    #packing_factor_type_impl

                    #hash_tree_root_fn_impl
                }
            });

            if let Some(signed_root_fn_impl) = self.signed_root_fn_impl(&ssz)? {
                impls.append_all(quote! {
                    impl #impl_generics #ssz::SignedRoot for #ident #ty_generics #where_clause {
                        #signed_root_fn_impl
                    }
                });
            }
        }

        Ok(impls)
    }

    fn validate(&self) -> Result<(), Error> {
        let Self {
            derive_hash,
            derive_size,
            derive_write,
            transparent,
            ..
        } = *self;

        if !(derive_hash || derive_size || derive_write) {
            return Err(Error::new(
                Span::call_site(),
                "at least one impl must be derived",
            ));
        }

        let signature_fields = self
            .all_fields()?
            .filter(|(_, ssz_field)| ssz_field.signature)
            .collect_vec();

        if signature_fields.len() > 1 {
            return Err(Error::new(
                Span::call_site(),
                "at most one field can be marked as the signature",
            ));
        }

        if transparent && !signature_fields.is_empty() {
            return Err(Error::new(
                Span::call_site(),
                "transparent structs cannot have a signature field",
            ));
        }

        if signature_fields.iter().any(|(_, ssz_field)| ssz_field.skip) {
            return Err(Error::new(
                Span::call_site(),
                "skipped fields cannot be marked as the signature",
            ));
        }

        Ok(())
    }

    fn split_for_impl(&self) -> (ImplGenerics, TypeGenerics, Option<WhereClause>) {
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        let where_clause = self
            .bound
            .clone()
            .map(|predicates| WhereClause {
                where_token: Where::default(),
                predicates,
            })
            .or_else(|| where_clause.cloned());

        (impl_generics, ty_generics, where_clause)
    }

    fn ssz_path(&self) -> Result<Path, Error> {
        if self.internal {
            return Ok(parse_quote! { crate });
        }

        let call_site = Span::call_site();

        let name = match proc_macro_crate::crate_name("ssz")
            .map_err(|error| Error::new(call_site, error))?
        {
            FoundCrate::Itself => Cow::Borrowed("ssz"),
            FoundCrate::Name(renamed) => Cow::Owned(renamed),
        };

        let ident = Ident::new(&name, call_site);

        Ok(parse_quote! { ::#ident })
    }

    fn size_expr(&self, ssz: &Path) -> Result<Expr, Error> {
        if self.transparent {
            self.single_unskipped_field()?;
        }

        let size_exprs = self
            .unskipped_fields()?
            .map(|(_, ssz_field)| ssz_field.size_expr(ssz))
            .collect_vec();

        Ok(parse_quote! {
            #ssz::Size::for_container([
                #(#size_exprs,)*
            ])
        })
    }

    fn write_fixed_fn_impl(&self, ssz: &Path) -> Result<ImplItemFn, Error> {
        if self.transparent {
            let (member, _) = self.single_unskipped_field()?;

            return Ok(parse_quote! {
                #[inline]
                fn write_fixed(&self, bytes: &mut [u8]) {
                    #ssz::SszWrite::write_fixed(&self.#member, bytes)
                }
            });
        }

        let stmts = self.unskipped_fields()?.map(|(member, ssz_field)| {
            let size_expr = ssz_field.size_expr(ssz);

            quote! {
                let size = #size_expr.fixed_part();
                #ssz::SszWrite::write_fixed(&self.#member, &mut bytes[..size]);
                let bytes = &mut bytes[size..];
            }
        });

        Ok(parse_quote! {
            fn write_fixed(&self, bytes: &mut [u8]) {
                #(#stmts)*
            }
        })
    }

    fn write_variable_fn_impl(&self, ssz: &Path) -> Result<ImplItemFn, Error> {
        if self.transparent {
            let (member, _) = self.single_unskipped_field()?;

            return Ok(parse_quote! {
                #[inline]
                fn write_variable(
                    &self,
                    bytes: &mut ::std::vec::Vec<u8>,
                ) -> ::core::result::Result<(), #ssz::WriteError> {
                    #ssz::SszWrite::write_variable(&self.#member, bytes)
                }
            });
        }

        // Offsets are filled in after the fixed parts of all fields have been written.
        let fixed_part_stmts = self.unskipped_fields()?.map(|(member, ssz_field)| {
            let size_expr = ssz_field.size_expr(ssz);
            let position_ident = member.position_ident();

            quote! {
                let #position_ident = bytes.len();
                let length_with_fixed_part = #position_ident + #size_expr.fixed_part();

                bytes.resize(length_with_fixed_part, 0);

                if let #ssz::Size::Fixed { .. } = #size_expr {
                    let subslice = &mut bytes[#position_ident..length_with_fixed_part];
                    #ssz::SszWrite::write_fixed(&self.#member, subslice);
                }
            }
        });

        let variable_part_stmts = self.unskipped_fields()?.map(|(member, ssz_field)| {
            let size_expr = ssz_field.size_expr(ssz);
            let position_ident = member.position_ident();

            quote! {
                if let #ssz::Size::Variable { .. } = #size_expr {
                    let offset = bytes.len() - length_before;
                    #ssz::write_offset(bytes, #position_ident, offset)?;
                    #ssz::SszWrite::write_variable(&self.#member, bytes)?;
                }
            }
        });

        Ok(parse_quote! {
            fn write_variable(
                &self,
                bytes: &mut ::std::vec::Vec<u8>,
            ) -> ::core::result::Result<(), #ssz::WriteError> {
                let length_before = bytes.len();
                #(#fixed_part_stmts)*
                #(#variable_part_stmts)*
                ::core::result::Result::Ok(())
            }
        })
    }

    fn packing_factor_type_impl(&self, ssz: &Path) -> Result<ImplItemType, Error> {
        if self.transparent {
            let (_, ssz_field) = self.single_unskipped_field()?;
            let ty = &ssz_field.ty;

            Ok(parse_quote! { type PackingFactor = <#ty as #ssz::SszHash>::PackingFactor; })
        } else {
            Ok(parse_quote! { type PackingFactor = #ssz::U1; })
        }
    }

    fn hash_tree_root_fn_impl(&self, ssz: &Path) -> Result<ImplItemFn, Error> {
        if self.transparent {
            let (member, _) = self.single_unskipped_field()?;

            return Ok(parse_quote! {
                #[inline]
                fn hash_tree_root(&self) -> #ssz::H256 {
                    #ssz::SszHash::hash_tree_root(&self.#member)
                }
            });
        }

        let root = merkleize_members(ssz, self.unskipped_fields()?.map(|(member, _)| member))?;

        Ok(parse_quote! {
            fn hash_tree_root(&self) -> #ssz::H256 {
                #root
            }
        })
    }

    fn signed_root_fn_impl(&self, ssz: &Path) -> Result<Option<ImplItemFn>, Error> {
        if !self.unskipped_fields()?.any(|(_, ssz_field)| ssz_field.signature) {
            return Ok(None);
        }

        let members = self
            .unskipped_fields()?
            .filter(|(_, ssz_field)| !ssz_field.signature)
            .map(|(member, _)| member);

        let root = merkleize_members(ssz, members)?;

        Ok(Some(parse_quote! {
            fn signed_root(&self) -> #ssz::H256 {
                #root
            }
        }))
    }

    fn single_unskipped_field(&self) -> Result<(Member, &SszField), Error> {
        self.unskipped_fields()?.exactly_one().map_err(|_| {
            Error::new(
                Span::call_site(),
                "struct with transparent attribute must have exactly one unskipped field",
            )
        })
    }

    fn unskipped_fields(&self) -> Result<impl Iterator<Item = (Member, &SszField)>, Error> {
        let fields = self.all_fields()?;
        Ok(fields.filter(|(_, ssz_field)| !ssz_field.skip))
    }

    fn all_fields(&self) -> Result<impl Iterator<Item = (Member, &SszField)>, Error> {
        match &self.data {
            Data::Enum(_) => Err(Error::new(
                Span::call_site(),
                "SSZ unions are not implemented",
            )),
            Data::Struct(fields) if fields.is_empty() => Err(Error::new(
                Span::call_site(),
                "SSZ containers with no fields are illegal",
            )),
            Data::Struct(fields) => Ok(fields.iter().enumerate().map(|(position, ssz_field)| {
                let member = ssz_field
                    .ident
                    .clone()
                    .map(Member::Named)
                    .unwrap_or_else(|| Member::Unnamed(position.into()));
                (member, ssz_field)
            })),
        }
    }
}

#[ext]
impl Member {
    // Formatting like this is needed to make tuple structs work.
    fn position_ident(&self) -> Ident {
        format_ident!("position_of_{}", self)
    }
}

// Builds the expression for the root of a container with the given fields.
// The tree is unrolled at compile time with zero hashes padding odd levels.
fn merkleize_members(
    ssz: &Path,
    members: impl IntoIterator<Item = Member>,
) -> Result<TokenStream, Error> {
    let mut nodes = members
        .into_iter()
        .map(|member| quote! { #ssz::SszHash::hash_tree_root(&self.#member) })
        .collect_vec();

    let mut height = 0_usize;

    loop {
        match nodes.len() {
            0 => {
                return Err(Error::new(
                    Span::call_site(),
                    "struct has no fields to merkleize",
                ));
            }
            1 => return Ok(nodes.swap_remove(0)),
            _ => {
                let zero_hash_expr = quote! { #ssz::hashing::ZERO_HASHES[#height] };

                nodes = nodes
                    .into_iter()
                    .chain(core::iter::once(zero_hash_expr))
                    .tuples()
                    .map(|(left, right)| quote! { #ssz::hashing::hash_256_256(#left, #right) })
                    .collect();

                height += 1;
            }
        }
    }
}

// The value of the `default` attribute passed to Darling must be a path to a function.
const fn default_to_true() -> bool {
    true
}
