use crate::common::{resolve_path, Result};
use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use std::collections::HashSet;
use std::fs::{metadata, read_dir, read_to_string};
use std::path::{Path, PathBuf};
use syn::parse::Parse;
use syn::token::Super;
use syn::{Item, LitStr, Token, VisRestricted, Visibility};

pub(crate) struct MigrateInput {
    pub_token: Option<Token![pub]>,
    ident: Ident,
    _comma: Token![,],
    path: LitStr,
}

impl Parse for MigrateInput {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let pub_token = if input.peek(Token![pub]) {
            Some(input.parse()?)
        } else {
            None
        };

        Ok(Self {
            pub_token,
            ident: input.parse()?,
            _comma: input.parse()?,
            path: input.parse()?,
        })
    }
}

struct QuotedMigration {
    identifier: String,
    mod_name: Ident,
    has_description: bool,
}

impl ToTokens for QuotedMigration {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let QuotedMigration {
            identifier,
            mod_name,
            has_description,
        } = &self;

        let description_ref = if *has_description {
            quote! { Some(&#mod_name::description) }
        } else {
            quote! { None }
        };

        let ts = quote! {
            ::stepwise::migrate::Migration {
                identifier: ::std::borrow::Cow::Borrowed(#identifier),
                description: #description_ref,
                up: &#mod_name::up,
                down: &#mod_name::down,
            }
        };

        tokens.append_all(ts);
    }
}

fn mod_name_for(identifier: &str) -> Result<Ident> {
    let sanitized = identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();

    Ok(Ident::new(&format!("m_{}", sanitized), Span::call_site()))
}

fn collect_migration_files(path: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in read_dir(path)? {
        let entry = entry?;
        if !metadata(entry.path())?.is_file() {
            // not a file; ignore
            continue;
        }

        let file_path = entry.path();
        if file_path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }

        let Some(identifier) = file_path.file_stem().and_then(|s| s.to_str()) else {
            return Err(format!("invalid migration file name {}", file_path.display()).into());
        };

        files.push((identifier.to_string(), file_path.clone()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

pub(crate) fn expand_migrator_from_lit_dir(migrate_input: MigrateInput) -> Result<TokenStream> {
    let path = resolve_path(migrate_input.path.value(), migrate_input.path.span())?;
    expand_migrator(&path, &migrate_input.ident, &migrate_input.pub_token)
}

pub(crate) fn expand_migrator(
    path: &Path,
    migrator_name: &Ident,
    pub_token: &Option<Token![pub]>,
) -> Result<TokenStream> {
    let mut migrations = Vec::new();
    let mut migrations_mods = Vec::new();
    let mut mod_names = HashSet::new();

    for (identifier, file_path) in collect_migration_files(path)? {
        let migration_file = read_to_string(&file_path)?;
        let mod_name = mod_name_for(&identifier)?;
        if !mod_names.insert(mod_name.to_string()) {
            return Err(format!(
                "migration {} clashes with another migration module named {}",
                identifier, mod_name
            )
            .into());
        }

        let mut has_up = false;
        let mut has_down = false;
        let mut has_description = false;

        let mut program = syn::parse_file(&migration_file)?;
        for item in program.items.iter_mut() {
            if let Item::Fn(func) = item {
                func.vis = Visibility::Restricted(VisRestricted {
                    pub_token: Default::default(),
                    paren_token: Default::default(),
                    in_token: None,
                    path: Box::new(syn::Path::from(syn::parse_str::<Super>("super")?)),
                });

                match func.sig.ident.to_string().as_str() {
                    "up" => has_up = true,
                    "down" => has_down = true,
                    "description" => has_description = true,
                    _ => (),
                }
            }
        }

        if !has_up || !has_down {
            return Err(format!(
                "migration {} must define both `up` and `down` functions",
                file_path.display()
            )
            .into());
        }

        // makes the compiler track the file for changes
        let source_path = file_path.to_string_lossy().to_string();
        let migration_tokens: TokenStream = quote! {
            #[allow(non_snake_case)]
            mod #mod_name {
                const _: &str = include_str!(#source_path);

                #program
            }
        };

        migrations_mods.push(migration_tokens);
        migrations.push(QuotedMigration {
            identifier,
            mod_name,
            has_description,
        });
    }

    let token_stream: TokenStream = quote! {
        #pub_token static #migrator_name: ::stepwise::migrate::Migrator = ::stepwise::migrate::Migrator::new(
            ::std::borrow::Cow::Borrowed(&[
                #(#migrations),*
            ]),
        );

        #(#migrations_mods)*
    };

    Ok(token_stream)
}
