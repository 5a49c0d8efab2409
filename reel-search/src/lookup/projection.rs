//! Fixed projections from raw lookup responses into [`Entity`]
//!
//! Lists may arrive under `results`, under `data`, or as a bare array. Each
//! lookup name has its own item shape.

use crate::error::LookupFailure;
use crate::models::{Entity, LookupName};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Identifier that may be numeric or textual
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{}", n),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawKeyword {
    id: RawId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    iso_3166_1: String,
    english_name: String,
    native_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLanguage {
    iso_639_1: String,
    english_name: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    id: RawId,
    name: String,
    known_for_department: Option<String>,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCompany {
    id: RawId,
    name: String,
    origin_country: Option<String>,
    logo_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    id: RawId,
    username: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

/// Project a raw response for `name` into entities
pub fn project(name: LookupName, raw: &Value, image_base_url: &str) -> Result<Vec<Entity>, LookupFailure> {
    let entities = match name {
        LookupName::Keyword => items::<RawKeyword>(raw)?
            .into_iter()
            .map(|k| Entity::new(k.id.to_string(), k.name))
            .collect(),
        LookupName::Country => items::<RawCountry>(raw)?
            .into_iter()
            .map(|c| {
                Entity::new(c.iso_3166_1, c.english_name)
                    .with_description(c.native_name.unwrap_or_default())
            })
            .collect(),
        LookupName::Language => items::<RawLanguage>(raw)?
            .into_iter()
            .map(|l| {
                Entity::new(l.iso_639_1, l.english_name).with_description(l.name.unwrap_or_default())
            })
            .collect(),
        LookupName::Actor | LookupName::Director => items::<RawPerson>(raw)?
            .into_iter()
            .map(|p| {
                Entity::new(p.id.to_string(), p.name)
                    .with_description(p.known_for_department.unwrap_or_default())
                    .with_image_url(complete_image_url(p.profile_path.as_deref(), image_base_url))
            })
            .collect(),
        LookupName::ProductionCompany => items::<RawCompany>(raw)?
            .into_iter()
            .map(|c| {
                Entity::new(c.id.to_string(), c.name)
                    .with_description(c.origin_country.unwrap_or_default())
                    .with_image_url(complete_image_url(c.logo_path.as_deref(), image_base_url))
            })
            .collect(),
        LookupName::People => items::<RawUser>(raw)?
            .into_iter()
            .map(|u| {
                let name = u
                    .display_name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| u.username.clone());
                Entity::new(u.id.to_string(), name)
                    .with_description(format!("@{}", u.username))
                    .with_image_url(u.avatar_url.filter(|a| !a.is_empty()))
            })
            .collect(),
    };
    Ok(entities)
}

/// Absolute image URL, completing relative paths against the image host
pub fn complete_image_url(path: Option<&str>, image_base_url: &str) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_string());
    }
    let base = image_base_url.trim_end_matches('/');
    if path.starts_with('/') {
        Some(format!("{}{}", base, path))
    } else {
        Some(format!("{}/{}", base, path))
    }
}

fn items<T: DeserializeOwned>(raw: &Value) -> Result<Vec<T>, LookupFailure> {
    let list = match raw {
        Value::Array(_) => raw,
        Value::Object(map) => map
            .get("results")
            .or_else(|| map.get("data"))
            .filter(|v| v.is_array())
            .ok_or_else(|| LookupFailure::Parse("no results list in response".to_string()))?,
        _ => return Err(LookupFailure::Parse("response is not a list".to_string())),
    };
    Vec::<T>::deserialize(list).map_err(|e| LookupFailure::Parse(e.to_string()))
}
