//! Resolution narratives, keyed by consent category.
//!
//! Loaded from a JSON object mapping each category to a list of templates.
//! Templates use `{{prey}}` and `{{pred}}` placeholders, replaced literally
//! with display names.

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct NarrativeTable {
    categories: HashMap<String, Vec<String>>,
}

impl NarrativeTable {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read narratives file: {}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid narratives file: {}", path))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let categories: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        for (category, templates) in &categories {
            anyhow::ensure!(!templates.is_empty(), "category '{}' has no narratives", category);
        }
        Ok(Self { categories })
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// A template for `category`, chosen uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> Option<&str> {
        self.categories
            .get(category)?
            .choose(rng)
            .map(String::as_str)
    }
}

/// Substitute both display names into a template.
pub fn render(template: &str, prey: &str, pred: &str) -> String {
    template.replace("{{prey}}", prey).replace("{{pred}}", pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    const TABLE: &str = r#"{
        "vore": ["{{pred}} swallows {{prey}} whole.", "{{prey}} slides into {{pred}}."],
        "cock": ["{{pred}} takes {{prey}} in."]
    }"#;

    #[test]
    fn test_from_json_and_pick() {
        let table = NarrativeTable::from_json(TABLE).unwrap();
        assert_eq!(table.category_count(), 2);
        assert!(table.contains("vore"));
        assert!(!table.contains("unbirth"));

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = table.pick("vore", &mut rng).unwrap();
            assert!(picked.contains("{{prey}}"));
        }
        assert_eq!(table.pick("cock", &mut rng), Some("{{pred}} takes {{prey}} in."));
        assert!(table.pick("unbirth", &mut rng).is_none());
    }

    #[test]
    fn test_pick_reaches_every_template() {
        let table = NarrativeTable::from_json(TABLE).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let seen: std::collections::HashSet<_> =
            (0..200).filter_map(|_| table.pick("vore", &mut rng)).collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_empty_category_rejected() {
        let err = NarrativeTable::from_json(r#"{"vore": []}"#).unwrap_err();
        assert!(err.to_string().contains("vore"));
    }

    #[test]
    fn test_render_replaces_every_placeholder() {
        assert_eq!(
            render("{{pred}} and {{prey}}; {{prey}} again", "Mira", "Rex"),
            "Rex and Mira; Mira again"
        );
    }

    #[test]
    fn test_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(TABLE.as_bytes()).unwrap();
        let table = NarrativeTable::from_file(f.path().to_str().unwrap()).unwrap();
        assert!(table.contains("cock"));
        assert!(NarrativeTable::from_file("/nonexistent/responses.json").is_err());
    }
}
