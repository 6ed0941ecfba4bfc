use crate::models::AddressComponents;
use std::collections::BTreeMap;
use std::path::Path;

/// Keyword → administrative breakdown for places the geocoder resolves poorly
/// (residential compounds, campus names and the like).
///
/// Loaded once at startup and handed to the [`crate::normalizer::Normalizer`].
/// Longer keywords are tried first so `"绿地中心二期"` wins over `"绿地中心"`.
#[derive(Debug, Clone, Default)]
pub struct KnownPlaces {
    entries: Vec<(String, AddressComponents)>,
}

impl KnownPlaces {
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, AddressComponents)>,
    {
        let mut entries: Vec<(String, AddressComponents)> = entries
            .into_iter()
            .map(|(keyword, place)| (keyword.trim().to_string(), place))
            .filter(|(keyword, _)| !keyword.is_empty())
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });
        entries.dedup_by(|(a, _), (b, _)| a == b);
        Self { entries }
    }

    /// Parses a JSON object of `{ "keyword": { "province": .., "city": .., ... } }`.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let map: BTreeMap<String, AddressComponents> = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Invalid known places JSON: {}", e))?;
        Ok(Self::from_entries(map))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read known places file {}: {}", path.display(), e)
        })?;
        let places = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded {} known place(s) from {}",
            places.len(),
            path.display()
        );
        Ok(places)
    }

    /// First (longest) keyword contained in the cleaned input.
    pub fn lookup(&self, cleaned: &str) -> Option<(&str, &AddressComponents)> {
        self.entries
            .iter()
            .find(|(keyword, _)| cleaned.contains(keyword.as_str()))
            .map(|(keyword, place)| (keyword.as_str(), place))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
