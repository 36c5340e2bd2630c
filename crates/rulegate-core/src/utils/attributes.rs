//! Attribute helpers for structural rules over Rust sources.

use syn::{Attribute, Meta};

/// Flattened token text of a list attribute, whitespace removed.
fn list_tokens(attr: &Attribute) -> Option<String> {
    match &attr.meta {
        Meta::List(list) => Some(list.tokens.to_string().replace(' ', "")),
        Meta::Path(_) | Meta::NameValue(_) => None,
    }
}

/// Checks if attributes contain an `#[allow(...)]` for any of `lint_names`
/// (e.g. `"clippy::unwrap_used"`).
#[must_use]
pub fn has_allow_attr(attrs: &[Attribute], lint_names: &[&str]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("allow") || attr.path().is_ident("expect"))
        .filter_map(list_tokens)
        .any(|tokens| {
            tokens
                .split(',')
                .any(|lint| lint_names.iter().any(|name| lint == name.replace(' ', "")))
        })
}

/// Checks for a test attribute: `#[test]` or a runner's `#[<crate>::test]`.
#[must_use]
pub fn has_test_attr(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path()
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "test")
    })
}

/// Checks for `#[cfg(test)]`, including `#[cfg(all(test, ...))]`.
#[must_use]
pub fn has_cfg_test(attrs: &[Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("cfg"))
        .filter_map(list_tokens)
        .any(|tokens| {
            tokens
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .any(|word| word == "test")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_has_allow_attr() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[allow(dead_code, clippy::unwrap_used)])];
        assert!(has_allow_attr(&attrs, &["clippy::unwrap_used"]));
        assert!(!has_allow_attr(&attrs, &["clippy::expect_used"]));
    }

    #[test]
    fn test_has_test_attr() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[test])];
        assert!(has_test_attr(&attrs));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[tokio::test])];
        assert!(has_test_attr(&attrs));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[inline])];
        assert!(!has_test_attr(&attrs));
    }

    #[test]
    fn test_has_cfg_test() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[cfg(test)])];
        assert!(has_cfg_test(&attrs));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[cfg(all(test, unix))])];
        assert!(has_cfg_test(&attrs));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[cfg(feature = "testing")])];
        assert!(!has_cfg_test(&attrs));
    }
}
