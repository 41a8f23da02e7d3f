/// Trim surrounding whitespace; an absent cell becomes the empty string.
pub fn clean_cell(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or_default().to_string()
}

pub fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

/// True if `haystack` contains any of the (already lowercased) `needles`.
pub fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| !n.is_empty() && haystack.contains(n.as_str()))
}

pub fn lowercase_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

/// Spreadsheet column name for a zero-based index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
