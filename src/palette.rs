//! Presentation tokens for listing cards. Each article gets a background
//! gradient and an icon picked from fixed palettes by a hash of its title, so
//! a given title always renders the same way no matter how the corpus
//! around it changes.

/// Card background gradients.
pub const COLORS: &[&str] = &[
    "linear-gradient(135deg, #2563EB, #1E40AF)",
    "linear-gradient(135deg, #10B981, #059669)",
    "linear-gradient(135deg, #8B5CF6, #6D28D9)",
    "linear-gradient(135deg, #F59E0B, #D97706)",
    "linear-gradient(135deg, #EC4899, #DB2777)",
    "linear-gradient(135deg, #14B8A6, #0F766E)",
    "linear-gradient(135deg, #EF4444, #B91C1C)",
];

/// Font Awesome icon classes shown over the card background.
pub const ICONS: &[&str] = &[
    "fa-robot",
    "fa-brain",
    "fa-database",
    "fa-microchip",
    "fa-code",
    "fa-server",
    "fa-chart-network",
];

/// The sum of the title's Unicode scalar values.
pub fn title_hash(title: &str) -> u64 {
    title.chars().map(|c| c as u64).sum()
}

/// Picks an index into a palette of `len` entries for `title`.
pub fn index(title: &str, len: usize) -> usize {
    (title_hash(title) % len as u64) as usize
}

pub fn color(title: &str) -> &'static str {
    COLORS[index(title, COLORS.len())]
}

pub fn icon(title: &str) -> &'static str {
    ICONS[index(title, ICONS.len())]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_title_hash_is_character_code_sum() {
        assert_eq!(0, title_hash(""));
        assert_eq!(97 + 98 + 99, title_hash("abc"));
        assert_eq!(233, title_hash("é"));
    }

    #[test]
    fn test_assignment_is_stable() {
        // 97 + 98 + 99 = 294 = 42 * 7
        assert_eq!(COLORS[0], color("abc"));
        assert_eq!(ICONS[0], icon("abc"));
        assert_eq!(COLORS[1], color("abd"));
        assert_eq!(color("Transformers Explained"), color("Transformers Explained"));
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(COLORS[0], color(""));
        assert_eq!(ICONS[0], icon(""));
    }
}
