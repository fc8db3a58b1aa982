/// Parse a scraped price label into a decimal amount.
///
/// Currency symbols and other noise are stripped first, leaving digits and
/// separators. When both `.` and `,` survive, whichever occurs last is the
/// decimal separator and the other is dropped as grouping ("1.234,56" ->
/// 1234.56, "1,234.56" -> 1234.56). A lone comma is a decimal separator
/// ("19,99" -> 19.99). Anything unparsable yields None.
pub fn parse_money(raw: &str) -> Option<f64> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if clean.is_empty() {
        return None;
    }

    let normalized = match (clean.rfind('.'), clean.rfind(',')) {
        (Some(dot), Some(comma)) if dot > comma => clean.replace(',', ""),
        (Some(_), Some(_)) => clean.replace('.', "").replace(',', "."),
        (None, Some(_)) => clean.replace(',', "."),
        _ => clean,
    };

    normalized.parse::<f64>().ok()
}
