use std::{fmt, str::FromStr};

pub const FALLBACK_TIP: &str = "No handling information is available for this category.";

/// Waste categories with a known handling tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WasteCategory {
    Cardboard,
    Glass,
    Metal,
    Paper,
    Plastic,
    Trash,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 6] = [
        WasteCategory::Cardboard,
        WasteCategory::Glass,
        WasteCategory::Metal,
        WasteCategory::Paper,
        WasteCategory::Plastic,
        WasteCategory::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Cardboard => "cardboard",
            WasteCategory::Glass => "glass",
            WasteCategory::Metal => "metal",
            WasteCategory::Paper => "paper",
            WasteCategory::Plastic => "plastic",
            WasteCategory::Trash => "trash",
        }
    }

    pub fn tip(&self) -> &'static str {
        match self {
            WasteCategory::Cardboard => {
                "Flatten and dry cardboard. Recycle it or reuse it for crafts."
            }
            WasteCategory::Glass => {
                "Glass is recyclable. Sort it by color and keep it away from organic waste."
            }
            WasteCategory::Metal => {
                "Metal such as cans can be sold to scrap collectors. Rinse it before collecting."
            }
            WasteCategory::Paper => "Used paper is recyclable. Do not mix it with wet waste.",
            WasteCategory::Plastic => {
                "Clean plastic is recyclable. Never burn it, the smoke is toxic."
            }
            WasteCategory::Trash => {
                "Residual waste cannot be recycled. Put it in a regular bin or send it to landfill."
            }
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for WasteCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        WasteCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or(UnknownCategory(normalized))
    }
}

/// Case-insensitive tip lookup. Unknown labels get [`FALLBACK_TIP`].
pub fn handling_tip(label: &str) -> &'static str {
    label
        .parse::<WasteCategory>()
        .map(|category| category.tip())
        .unwrap_or(FALLBACK_TIP)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(handling_tip("plastic"), WasteCategory::Plastic.tip());
        assert_eq!(handling_tip("PLASTIC"), handling_tip("plastic"));
        assert_eq!(handling_tip("  Cardboard "), WasteCategory::Cardboard.tip());
    }

    #[test]
    fn test_unknown_label_gets_fallback() {
        assert_eq!(handling_tip("unknown-category"), FALLBACK_TIP);
        assert_eq!(handling_tip(""), FALLBACK_TIP);
    }

    #[test]
    fn test_every_category_round_trips_through_its_name() {
        for category in WasteCategory::ALL {
            assert_eq!(category.as_str().parse::<WasteCategory>(), Ok(category));
            assert_ne!(category.tip(), FALLBACK_TIP);
        }
    }
}
