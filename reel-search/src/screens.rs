//! Search screen profiles
//!
//! Each screen (movie, news, user, admin) fixes its filter set, page size,
//! request field names and search endpoint at mount time.

use crate::error::FilterSpecError;
use crate::filters::FilterSet;
use crate::models::{Cardinality, FilterSpec, LookupName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// URL parameter carrying the free-text query
pub const URL_QUERY_KEY: &str = "q";
/// URL parameter carrying the page number
pub const URL_PAGE_KEY: &str = "page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenKind {
    Movie,
    News,
    User,
    Admin,
}

impl ScreenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenKind::Movie => "movie",
            ScreenKind::News => "news",
            ScreenKind::User => "user",
            ScreenKind::Admin => "admin",
        }
    }
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScreenKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" | "movies" => Ok(ScreenKind::Movie),
            "news" => Ok(ScreenKind::News),
            "user" | "users" => Ok(ScreenKind::User),
            "admin" => Ok(ScreenKind::Admin),
            other => Err(format!("unknown screen: {}", other)),
        }
    }
}

/// Static configuration of one search screen
#[derive(Debug, Clone)]
pub struct ScreenProfile {
    pub kind: ScreenKind,
    /// Search service path, relative to the API base URL
    pub endpoint: String,
    pub page_size: u32,
    /// Request field carrying the query text
    pub query_param: String,
    pub page_param: String,
    pub page_size_param: String,
    pub filters: FilterSet,
}

impl ScreenProfile {
    pub fn for_kind(kind: ScreenKind) -> Result<Self, FilterSpecError> {
        match kind {
            ScreenKind::Movie => Self::movie(),
            ScreenKind::News => Self::news(),
            ScreenKind::User => Self::user(),
            ScreenKind::Admin => Self::admin(),
        }
    }

    /// Build a custom profile around an arbitrary filter set
    pub fn custom(
        kind: ScreenKind,
        endpoint: &str,
        page_size: u32,
        query_param: &str,
        filters: FilterSet,
    ) -> Self {
        Self {
            kind,
            endpoint: endpoint.to_string(),
            page_size: page_size.max(1),
            query_param: query_param.to_string(),
            page_param: "page".to_string(),
            page_size_param: "pageSize".to_string(),
            filters,
        }
    }

    pub fn movie() -> Result<Self, FilterSpecError> {
        let filters = FilterSet::new(vec![
            FilterSpec::multiselect("genres", "Genres").with_options(&[
                "Action",
                "Adventure",
                "Animation",
                "Comedy",
                "Crime",
                "Documentary",
                "Drama",
                "Fantasy",
                "Horror",
                "Romance",
                "Science Fiction",
                "Thriller",
            ]),
            FilterSpec::range("year", "Release year", 1900.0, 2030.0),
            FilterSpec::range("rating", "Rating", 0.0, 10.0),
            FilterSpec::select("sortBy", "Sort by", Some("popularity")).with_options(&[
                "popularity",
                "rating",
                "releaseDate",
                "title",
            ]),
            FilterSpec::lookup("actor", "Actor", LookupName::Actor, Cardinality::Single)
                .send_entity_names(),
            FilterSpec::lookup("director", "Director", LookupName::Director, Cardinality::Single)
                .send_entity_names(),
            FilterSpec::lookup("keywords", "Keywords", LookupName::Keyword, Cardinality::Multi),
            FilterSpec::lookup("country", "Country", LookupName::Country, Cardinality::Single),
            FilterSpec::lookup("language", "Language", LookupName::Language, Cardinality::Single),
            FilterSpec::lookup(
                "company",
                "Production company",
                LookupName::ProductionCompany,
                Cardinality::Single,
            )
            .with_param("productionCompany")
            .send_entity_names(),
        ])?;

        Ok(Self::custom(ScreenKind::Movie, "movies/search", 28, "title", filters))
    }

    pub fn news() -> Result<Self, FilterSpecError> {
        let filters = FilterSet::new(vec![
            FilterSpec::select("category", "Category", None).with_options(&[
                "releases",
                "festivals",
                "interviews",
                "reviews",
            ]),
            FilterSpec::lookup("author", "Author", LookupName::People, Cardinality::Single)
                .with_param("authorId"),
            FilterSpec::text("tag", "Tag"),
            FilterSpec::select("sortBy", "Sort by", Some("newest"))
                .with_options(&["newest", "oldest", "popular"]),
        ])?;

        Ok(Self::custom(ScreenKind::News, "news/search", 12, "query", filters))
    }

    pub fn user() -> Result<Self, FilterSpecError> {
        let filters = FilterSet::new(vec![
            FilterSpec::select("role", "Role", None).with_options(&["user", "critic", "admin"]),
            FilterSpec::lookup(
                "followedBy",
                "Followed by",
                LookupName::People,
                Cardinality::Single,
            ),
        ])?;

        Ok(Self::custom(ScreenKind::User, "users/search", 20, "query", filters))
    }

    pub fn admin() -> Result<Self, FilterSpecError> {
        let filters = FilterSet::new(vec![
            FilterSpec::select("role", "Role", None).with_options(&["user", "critic", "admin"]),
            FilterSpec::select("status", "Status", None)
                .with_options(&["active", "suspended", "banned"]),
            FilterSpec::range("joinedYear", "Joined", 2015.0, 2030.0),
        ])?;

        Ok(Self::custom(ScreenKind::Admin, "admin/users", 25, "query", filters))
    }
}
