//! Name cleaning applied before fuzzy comparison.
//!
//! Each vocabulary gets its own cleaner because the lists spell names
//! differently: dictionary names are already bare, local names carry a
//! strength after the name, and source names mix in dosage forms, Spanish
//! connectives ("de") and parenthesised details.

use tracing::warn;

/// Clean a dictionary display name.
pub fn clean_reference_name(name: &str) -> String {
    name.to_lowercase()
}

/// Clean a local drug list name: everything before the first comma or digit.
pub fn clean_local_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let end = lower
        .char_indices()
        .find(|&(_, c)| c == ',' || c.is_ascii_digit())
        .map_or(lower.len(), |(idx, _)| idx);
    lower[..end].trim().to_string()
}

/// Clean a primary list name.
///
/// Cuts at the first comma, `de`, hyphen, opening parenthesis or digit. When
/// that leaves nothing, the first word of the name is used instead and a
/// warning names the input.
pub fn clean_source_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let end = source_cut(&lower).unwrap_or(lower.len());
    let cleaned = lower[..end].trim();
    if !cleaned.is_empty() {
        return cleaned.to_string();
    }

    let fallback = lower.split_whitespace().next().unwrap_or_default().to_string();
    warn!(
        name = %name,
        fallback = %fallback,
        "source name cleaned to an empty string, using its first word"
    );
    fallback
}

fn source_cut(lower: &str) -> Option<usize> {
    lower.char_indices().find_map(|(idx, c)| {
        let delimiter = matches!(c, ',' | '-' | '(') || c.is_ascii_digit();
        (delimiter || lower[idx..].starts_with("de")).then_some(idx)
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn reference_name_is_lowercased() {
        assert_eq!(clean_reference_name("Acetaminophen Tablet"), "acetaminophen tablet");
    }

    #[test]
    fn local_name_stops_at_strength() {
        assert_eq!(clean_local_name("Acetaminophen 500mg"), "acetaminophen");
        assert_eq!(clean_local_name("Amoxicillin, oral suspension"), "amoxicillin");
        assert_eq!(clean_local_name("Zinc sulfate"), "zinc sulfate");
    }

    #[test]
    fn source_name_examples() {
        assert_eq!(clean_source_name("Acetaminophen, 500 MG Tablet"), "acetaminophen");
        assert_eq!(clean_source_name("Cloruro de sodio 0.9%"), "cloruro");
        assert_eq!(clean_source_name("Metformina-glibenclamida"), "metformina");
        assert_eq!(clean_source_name("Salbutamol (aerosol)"), "salbutamol");
        assert_eq!(clean_source_name("  Losartan  "), "losartan");
    }

    #[test]
    fn only_decimal_digits_cut_names() {
        assert_eq!(clean_source_name("Vitamina B₁₂ inyectable"), "vitamina b₁₂ inyectable");
        assert_eq!(clean_source_name("Calcio ½ tableta"), "calcio ½ tableta");
        assert_eq!(clean_local_name("Zinc² sulfate 20mg"), "zinc² sulfate");
    }

    #[test]
    fn source_name_falls_back_to_first_word() {
        // "de" inside the first word cuts the name down to nothing
        assert_eq!(clean_source_name("Dexametasona 8 mg"), "dexametasona");
        assert_eq!(clean_source_name("(Vitamina) C"), "(vitamina)");
        assert_eq!(clean_source_name("   "), "");
    }

    proptest! {
        #[test]
        fn comma_cuts_the_name(prefix in "[a-cf-z][a-cf-z ]{0,11}", rest in "\\PC{0,20}") {
            let input = format!("{},{}", prefix.to_uppercase(), rest);
            prop_assert_eq!(clean_source_name(&input), prefix.trim().to_string());
        }

        #[test]
        fn undelimited_name_is_kept(name in "[A-Ca-cF-Zf-z ]{0,20}") {
            prop_assert_eq!(clean_source_name(&name), name.to_lowercase().trim().to_string());
        }
    }
}
