use std::collections::{HashMap, HashSet};

use regex::Regex;
use sea_orm::DbErr;

use crate::{
    api::helpers::{AuthorSummary, unique_violation_as},
    database::models::posts,
    errors::AppError,
};

use super::structures::PostView;

pub const SLUG_TAKEN: &str = "This URL slug is already in use. Please choose another one.";

lazy_static::lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9_\s-]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref HYPHENS: Regex = Regex::new(r"-+").unwrap();
}

/// Turns a title into a URL slug: lowercase, punctuation dropped, whitespace
/// runs collapsed into single hyphens.
pub fn generate_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    HYPHENS
        .replace_all(&hyphenated, "-")
        .trim_matches('-')
        .to_string()
}

pub fn map_slug_conflict(err: DbErr) -> AppError {
    unique_violation_as(err, SLUG_TAKEN)
}

pub fn author_ids(models: &[posts::Model]) -> HashSet<String> {
    models.iter().map(|post| post.author_id.clone()).collect()
}

pub fn build_post_views(
    models: Vec<posts::Model>,
    authors: &HashMap<String, AuthorSummary>,
) -> Vec<PostView> {
    models
        .into_iter()
        .map(|post| {
            let author = authors.get(&post.author_id).cloned();
            PostView { post, author }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_title() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("Rust  &  Actix: a tour"), "rust-actix-a-tour");
    }

    #[test]
    fn slug_collapses_hyphens_and_trims() {
        assert_eq!(generate_slug("  --already--slugged--  "), "already-slugged");
        assert_eq!(generate_slug("a - b"), "a-b");
    }

    #[test]
    fn slug_keeps_digits_and_underscores() {
        assert_eq!(generate_slug("Top_10 Crates 2025"), "top_10-crates-2025");
    }

    #[test]
    fn slug_of_symbols_is_empty() {
        assert_eq!(generate_slug("!!! ???"), "");
        assert_eq!(generate_slug("Café déjà vu"), "caf-dj-vu");
    }
}
