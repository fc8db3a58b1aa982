use once_cell::sync::OnceCell;
use regex::Regex;

/// Reduce a listing title to its duplicate-detection key.
///
/// Normalization steps:
/// - lowercase
/// - strip trademark marks, colons, apostrophes and hyphens
/// - collapse runs of whitespace to a single space
/// - trim
///
/// Two titles with equal normalized forms are the same item no matter which
/// storefront produced them.
pub fn normalize_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let lowered = raw.to_lowercase();

    static RE_SYMBOLS: OnceCell<Regex> = OnceCell::new();
    let re_symbols = RE_SYMBOLS.get_or_init(|| Regex::new(r"[™®©:'\-]").unwrap());
    let stripped = re_symbols.replace_all(&lowered, "");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    let collapsed = re_ws.replace_all(&stripped, " ");

    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trademark_and_case_do_not_distinguish() {
        assert_eq!(
            normalize_name("The Witcher 3™"),
            normalize_name("the witcher 3")
        );
    }

    #[test]
    fn strips_listed_symbols() {
        assert_eq!(
            normalize_name("Baldur's Gate: Enhanced"),
            "baldurs gate enhanced"
        );
        assert_eq!(normalize_name("Half-Life® 2"), "halflife 2");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(normalize_name("  Deep   Rock\tGalactic "), "deep rock galactic");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize_name(""), "");
    }
}
