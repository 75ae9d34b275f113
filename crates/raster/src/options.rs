use std::collections::BTreeMap;

/// Option key holding the spatial reference of a raster.
pub const SRS_KEY: &str = "SRS";

/// Free form string key/value metadata attached to a raster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterOptions(BTreeMap<String, String>);

impl RasterOptions {
    pub fn new() -> Self {
        RasterOptions::default()
    }

    pub fn with_srs(srs: &str) -> Self {
        let mut opts = RasterOptions::new();
        opts.set_srs(srs);
        opts
    }

    /// Value of an option, an empty string when the key is not present.
    pub fn get(&self, key: &str) -> &str {
        match self.0.get(key) {
            Some(value) => value,
            None => {
                log::warn!("Raster option '{key}' is not present");
                ""
            }
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn srs(&self) -> &str {
        self.0.get(SRS_KEY).map(String::as_str).unwrap_or_default()
    }

    pub fn set_srs(&mut self, srs: &str) {
        self.insert(SRS_KEY, srs);
    }

    /// Makes sure the spatial reference entry exists, empty when unknown.
    pub fn ensure_srs(&mut self) {
        self.0.entry(SRS_KEY.to_string()).or_default();
    }

    /// Copies all entries of `other`, existing keys are overwritten.
    pub fn merge(&mut self, other: &RasterOptions) {
        self.0.extend(other.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RasterOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RasterOptions(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
