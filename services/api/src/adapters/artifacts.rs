//! services/api/src/adapters/artifacts.rs
//!
//! Met Open Access adapter for the artifact-enrichment capability. No API
//! key required; images are CC0. Lookups are keyed by (culture, category)
//! and memoized through the injected cache, including negative results.
//! Every failure path resolves to `None`; enrichment never blocks the
//! pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use along_core::cache::KeyValueCache;
use along_core::domain::MetArtifact;
use along_core::ports::ArtifactService;

const MET_BASE: &str = "https://collectionapi.metmuseum.org/public/collection/v1";

// category → Met department ID + search term
const CATEGORY_MAP: &[(&str, u32, &str)] = &[
    ("restaurant", 6, "vessel bowl ceramic"),
    ("bar", 6, "vessel cup drinking"),
    ("cafe", 6, "vessel cup tea"),
    ("architecture", 13, "architectural fragment column capital"),
    ("landmark", 13, "relief monument sculpture"),
    ("museum", 11, "painting interior gallery"),
    ("gallery", 11, "painting frame"),
    ("temple", 14, "religious object altar ceremonial"),
    ("church", 15, "religious sculpture icon"),
    ("market", 20, "textile weaving pattern"),
    ("shop", 12, "decorative object craft"),
    ("hotel", 12, "furniture domestic chair table"),
    ("accommodation", 12, "furniture bed chamber"),
    ("park", 3, "botanical garden plant flower"),
    ("garden", 6, "garden landscape nature ceramic"),
    ("nightlife", 17, "musical instrument performance"),
    ("transport", 5, "armor vehicle weapon"),
    ("beach", 8, "oceanic vessel canoe boat"),
    ("viewpoint", 13, "landscape horizon vista sculpture"),
];

// Culture name → search term (some cultures need expansion)
const CULTURE_MAP: &[(&str, &str)] = &[
    ("italian", "Roman Italian"),
    ("french", "French"),
    ("japanese", "Japanese"),
    ("chinese", "Chinese"),
    ("greek", "Greek ancient"),
    ("roman", "Roman"),
    ("egyptian", "Egyptian ancient"),
    ("spanish", "Spanish"),
    ("portuguese", "Portuguese Iberian"),
    ("indian", "Indian"),
    ("thai", "Thai Southeast Asian"),
    ("moroccan", "Moroccan Islamic"),
    ("turkish", "Turkish Ottoman"),
    ("dutch", "Dutch Flemish"),
    ("american", "American"),
    ("british", "British English"),
];

fn category_config(category: &str) -> (u32, &'static str) {
    let normalized: String = category
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { '_' })
        .collect();
    CATEGORY_MAP
        .iter()
        .find(|(name, _, _)| *name == normalized)
        .map(|(_, dept, q)| (*dept, *q))
        .unwrap_or((13, "object artifact"))
}

fn normalize_culture(culture: &str) -> String {
    let lower = culture.to_lowercase();
    CULTURE_MAP
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, term)| term.to_string())
        .unwrap_or_else(|| culture.to_string())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "objectIDs")]
    object_ids: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    #[serde(rename = "objectID")]
    object_id: u64,
    #[serde(default)]
    title: String,
    #[serde(rename = "objectName", default)]
    object_name: String,
    #[serde(rename = "primaryImage", default)]
    primary_image: String,
    #[serde(rename = "isPublicDomain", default)]
    is_public_domain: bool,
    #[serde(rename = "objectURL", default)]
    object_url: String,
}

pub struct MetArtifactAdapter {
    client: reqwest::Client,
    cache: Arc<dyn KeyValueCache<Option<MetArtifact>>>,
}

impl MetArtifactAdapter {
    pub fn new(cache: Arc<dyn KeyValueCache<Option<MetArtifact>>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
        }
    }

    async fn search(&self, q: &str, department_id: u32, limit: usize) -> Vec<u64> {
        let result: Result<SearchResponse, _> = async {
            self.client
                .get(format!("{MET_BASE}/search"))
                .query(&[
                    ("q", q),
                    ("departmentId", &department_id.to_string()),
                    ("hasImages", "true"),
                    ("isPublicDomain", "true"),
                ])
                .timeout(Duration::from_secs(10))
                .send()
                .await?
                .json()
                .await
        }
        .await;

        match result {
            Ok(res) => res.object_ids.unwrap_or_default().into_iter().take(limit).collect(),
            Err(e) => {
                warn!(error = %e, q, "Met search failed");
                Vec::new()
            }
        }
    }

    async fn get_object(&self, id: u64) -> Option<MetArtifact> {
        let obj: ObjectResponse = self
            .client
            .get(format!("{MET_BASE}/objects/{id}"))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .ok()?
            .json()
            .await
            .ok()?;

        if obj.primary_image.is_empty() || !obj.is_public_domain {
            return None;
        }
        let met_url = if obj.object_url.is_empty() {
            format!(
                "https://www.metmuseum.org/art/collection/search/{}",
                obj.object_id
            )
        } else {
            obj.object_url
        };
        Some(MetArtifact {
            object_id: obj.object_id,
            title: if obj.title.is_empty() {
                "Untitled".to_string()
            } else {
                obj.title
            },
            object_name: obj.object_name,
            image_url: obj.primary_image,
            met_url,
        })
    }

    /// Tries each candidate id until one has a usable public-domain image.
    async fn first_usable(&self, ids: Vec<u64>) -> Option<MetArtifact> {
        for id in ids {
            if let Some(artifact) = self.get_object(id).await {
                return Some(artifact);
            }
        }
        None
    }
}

#[async_trait]
impl ArtifactService for MetArtifactAdapter {
    async fn lookup(&self, culture: &str, category: &str) -> Option<MetArtifact> {
        let cache_key = format!("{}|{}", culture.to_lowercase(), category.to_lowercase());
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        let (dept, base_q) = category_config(category);
        let culture_term = normalize_culture(culture);

        let ids = self.search(&format!("{culture_term} {base_q}"), dept, 15).await;
        let mut artifact = self.first_usable(ids).await;

        if artifact.is_none() {
            // Fallback: search just by culture without the category constraint.
            let ids = self.search(&culture_term, dept, 10).await;
            artifact = self.first_usable(ids).await;
        }

        self.cache.set(&cache_key, artifact.clone());
        artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_falls_back_to_generic_department() {
        assert_eq!(category_config("observatory"), (13, "object artifact"));
        assert_eq!(category_config("restaurant"), (6, "vessel bowl ceramic"));
    }

    #[test]
    fn culture_terms_expand_by_substring() {
        assert_eq!(normalize_culture("Northern Italian"), "Roman Italian");
        assert_eq!(normalize_culture("Lisbon"), "Lisbon");
    }
}
