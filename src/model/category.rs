use serde::{Deserialize, Serialize};

/// The fixed set of spending categories an expense can be assigned to.
#[derive(
    Default, Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum CategoryLabel {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Health,
    Bills,
    /// Used whenever classification fails or returns something we do not recognize.
    #[default]
    Other,
}

serde_plain::derive_display_from_serialize!(CategoryLabel);
serde_plain::derive_fromstr_from_deserialize!(CategoryLabel);

impl CategoryLabel {
    /// All labels, in the order they are offered to the classifier.
    pub const ALL: [CategoryLabel; 7] = [
        CategoryLabel::Food,
        CategoryLabel::Transport,
        CategoryLabel::Entertainment,
        CategoryLabel::Shopping,
        CategoryLabel::Health,
        CategoryLabel::Bills,
        CategoryLabel::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryLabel::Food => "Food",
            CategoryLabel::Transport => "Transport",
            CategoryLabel::Entertainment => "Entertainment",
            CategoryLabel::Shopping => "Shopping",
            CategoryLabel::Health => "Health",
            CategoryLabel::Bills => "Bills",
            CategoryLabel::Other => "Other",
        }
    }

    /// Leniently matches free text, such as a classifier reply, against the label set. Case,
    /// surrounding whitespace, quotes and trailing punctuation are ignored. Returns `None` when
    /// the text is not exactly one label.
    pub fn from_reply(text: impl AsRef<str>) -> Option<CategoryLabel> {
        let cleaned = text
            .as_ref()
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
            .trim_end_matches(['.', '!', ','])
            .trim();
        CategoryLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_and_from_str() {
        for label in CategoryLabel::ALL {
            assert_eq!(label.to_string(), label.as_str());
            assert_eq!(CategoryLabel::from_str(label.as_str()).unwrap(), label);
        }
    }

    #[test]
    fn test_from_str_is_strict() {
        assert!(CategoryLabel::from_str("food").is_err());
        assert!(CategoryLabel::from_str("Groceries").is_err());
    }

    #[test]
    fn test_from_reply() {
        assert_eq!(
            CategoryLabel::from_reply(" transport.\n"),
            Some(CategoryLabel::Transport)
        );
        assert_eq!(
            CategoryLabel::from_reply("\"Bills\""),
            Some(CategoryLabel::Bills)
        );
        assert_eq!(CategoryLabel::from_reply("HEALTH"), Some(CategoryLabel::Health));
        assert_eq!(CategoryLabel::from_reply("Food and drink"), None);
        assert_eq!(CategoryLabel::from_reply(""), None);
    }

    #[test]
    fn test_serde_uses_label_names() {
        let json = serde_json::to_string(&CategoryLabel::Entertainment).unwrap();
        assert_eq!(json, "\"Entertainment\"");
        let back: CategoryLabel = serde_json::from_str("\"Shopping\"").unwrap();
        assert_eq!(back, CategoryLabel::Shopping);
    }
}
