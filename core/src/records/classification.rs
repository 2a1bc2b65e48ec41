use serde::Deserialize;

const TAGGED: &str = "tagged";
const WAGGLE: &str = "waggle";

/// Row of the manually corrected per-day classification table (`data.csv`).
///
/// Corrected labels, when present, override the detector's own labels.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClassificationRecord {
    pub waggle_id: String,
    #[serde(default)]
    pub category_label: Option<String>,
    #[serde(default)]
    pub corrected_category_label: Option<String>,
    #[serde(default)]
    pub dance_type: Option<String>,
    #[serde(default)]
    pub corrected_dance_type: Option<String>,
}

impl ClassificationRecord {
    pub fn is_tagged(&self) -> bool {
        effective(&self.corrected_category_label, &self.category_label) == Some(TAGGED)
    }

    pub fn is_waggle(&self) -> bool {
        effective(&self.corrected_dance_type, &self.dance_type) == Some(WAGGLE)
    }
}

fn effective<'a>(corrected: &'a Option<String>, original: &'a Option<String>) -> Option<&'a str> {
    let present = |value: &'a Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    };
    present(corrected).or_else(|| present(original))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        category: &str,
        corrected_category: &str,
        dance: &str,
        corrected_dance: &str,
    ) -> ClassificationRecord {
        let some = |text: &str| (!text.is_empty()).then(|| text.to_string());
        ClassificationRecord {
            waggle_id: "1".into(),
            category_label: some(category),
            corrected_category_label: some(corrected_category),
            dance_type: some(dance),
            corrected_dance_type: some(corrected_dance),
        }
    }

    #[test]
    fn original_labels_apply_without_corrections() {
        let rec = record("tagged", "", "waggle", "");
        assert!(rec.is_tagged());
        assert!(rec.is_waggle());
    }

    #[test]
    fn corrections_override_original_labels() {
        let rec = record("tagged", "untagged", "other", "waggle");
        assert!(!rec.is_tagged());
        assert!(rec.is_waggle());
    }

    #[test]
    fn blank_correction_counts_as_absent() {
        let rec = record("untagged", "  ", "waggle", "");
        assert!(!rec.is_tagged());
    }
}
