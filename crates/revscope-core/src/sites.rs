//! Review sites and the per-site profile data that drives one shared pipeline.
//!
//! Google Maps, Kakao Map and Trip.com reviews go through the same
//! load → clean → derive → persist stages; the sites differ only in column
//! mapping, the text-cleaning policy, output naming and which optional
//! features are produced. Built-in profiles can be overridden from YAML.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// "Show more" markers that review cards leak into scraped text.
pub const DEFAULT_BOILERPLATE: &[&str] = &["... 더보기", "…더보기"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSite {
    Google,
    Kakao,
    Tripdotcom,
}

impl ReviewSite {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewSite::Google => "google",
            ReviewSite::Kakao => "kakao",
            ReviewSite::Tripdotcom => "tripdotcom",
        }
    }

    /// File name a crawl of this site is saved under.
    #[must_use]
    pub fn raw_file_name(self) -> String {
        format!("reviews_{}.csv", self.as_str())
    }

    #[must_use]
    pub fn default_profile(self) -> SiteProfile {
        let boilerplate = DEFAULT_BOILERPLATE.iter().map(|s| (*s).to_string()).collect();
        match self {
            ReviewSite::Google => SiteProfile {
                site: self,
                columns: ColumnMap::default(),
                clean_policy: CleanPolicy::AlphanumericOnly,
                boilerplate,
                output_naming: OutputNaming::PreprocessedPrefix,
                calendar_features: false,
                embeddings: true,
            },
            ReviewSite::Kakao => SiteProfile {
                site: self,
                columns: ColumnMap::default(),
                clean_policy: CleanPolicy::PreserveAll,
                boilerplate,
                output_naming: OutputNaming::ProcessedSuffix,
                calendar_features: false,
                embeddings: false,
            },
            ReviewSite::Tripdotcom => SiteProfile {
                site: self,
                columns: ColumnMap::default(),
                clean_policy: CleanPolicy::AlphanumericOnly,
                boilerplate,
                output_naming: OutputNaming::PreprocessedPrefix,
                calendar_features: true,
                embeddings: true,
            },
        }
    }
}

impl std::fmt::Display for ReviewSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewSite {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" => Ok(ReviewSite::Google),
            "kakao" => Ok(ReviewSite::Kakao),
            "tripdotcom" | "trip" | "trip.com" => Ok(ReviewSite::Tripdotcom),
            other => Err(ConfigError::UnknownSite(other.to_string())),
        }
    }
}

/// Which characters survive text normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanPolicy {
    /// Hangul syllables, ASCII letters, ASCII digits and whitespace only.
    AlphanumericOnly,
    /// Letters and digits of any script, whitespace and ASCII punctuation.
    KeepPunctuation,
    /// Every character; only whitespace and boilerplate are touched.
    PreserveAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputNaming {
    /// `preprocessed_<base>.csv`
    PreprocessedPrefix,
    /// `<base>_processed.csv`
    ProcessedSuffix,
}

impl OutputNaming {
    #[must_use]
    pub fn table_file_name(self, base: &str) -> String {
        match self {
            OutputNaming::PreprocessedPrefix => format!("preprocessed_{base}.csv"),
            OutputNaming::ProcessedSuffix => format!("{base}_processed.csv"),
        }
    }
}

/// Names of the input columns holding the three required review fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub rating: String,
    pub date: String,
    pub content: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            rating: "rating".to_string(),
            date: "date".to_string(),
            content: "content".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteProfile {
    pub site: ReviewSite,
    pub columns: ColumnMap,
    pub clean_policy: CleanPolicy,
    pub boilerplate: Vec<String>,
    pub output_naming: OutputNaming,
    /// Adds `month` and `weekday` columns during feature derivation.
    pub calendar_features: bool,
    /// Computes and persists a TF-IDF matrix alongside the table.
    pub embeddings: bool,
}

/// One entry of the site-profiles YAML file. Omitted fields keep the
/// built-in value for that site.
#[derive(Debug, Deserialize)]
struct SiteProfileEntry {
    site: ReviewSite,
    rating_column: Option<String>,
    date_column: Option<String>,
    content_column: Option<String>,
    clean_policy: Option<CleanPolicy>,
    boilerplate: Option<Vec<String>>,
    output_naming: Option<OutputNaming>,
    calendar_features: Option<bool>,
    embeddings: Option<bool>,
}

impl SiteProfileEntry {
    fn into_profile(self) -> SiteProfile {
        let mut profile = self.site.default_profile();
        if let Some(col) = self.rating_column {
            profile.columns.rating = col;
        }
        if let Some(col) = self.date_column {
            profile.columns.date = col;
        }
        if let Some(col) = self.content_column {
            profile.columns.content = col;
        }
        if let Some(policy) = self.clean_policy {
            profile.clean_policy = policy;
        }
        if let Some(markers) = self.boilerplate {
            profile.boilerplate = markers;
        }
        if let Some(naming) = self.output_naming {
            profile.output_naming = naming;
        }
        if let Some(flag) = self.calendar_features {
            profile.calendar_features = flag;
        }
        if let Some(flag) = self.embeddings {
            profile.embeddings = flag;
        }
        profile
    }
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    sites: Vec<SiteProfileEntry>,
}

/// Load site profile overrides from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_site_profiles(path: &Path) -> Result<Vec<SiteProfile>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_site_profiles(&content)
}

fn parse_site_profiles(content: &str) -> Result<Vec<SiteProfile>, ConfigError> {
    let file: SitesFile = serde_yaml::from_str(content)?;
    let profiles: Vec<SiteProfile> = file
        .sites
        .into_iter()
        .map(SiteProfileEntry::into_profile)
        .collect();
    validate_profiles(&profiles)?;
    Ok(profiles)
}

fn validate_profiles(profiles: &[SiteProfile]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for profile in profiles {
        if !seen.insert(profile.site) {
            return Err(ConfigError::Validation(format!(
                "duplicate site profile: '{}'",
                profile.site
            )));
        }

        let columns = [
            &profile.columns.rating,
            &profile.columns.date,
            &profile.columns.content,
        ];
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty column name",
                profile.site
            )));
        }
        let distinct: HashSet<&String> = columns.into_iter().collect();
        if distinct.len() != 3 {
            return Err(ConfigError::Validation(format!(
                "site '{}' maps two review fields to the same column",
                profile.site
            )));
        }

        if profile.boilerplate.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty boilerplate marker",
                profile.site
            )));
        }
    }

    Ok(())
}
