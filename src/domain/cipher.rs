/// Stateless decoding helpers. Cipher puzzles derive their answers
/// with these, and the overlay uses them for its live previews.
///
/// Letters are the uppercase ASCII alphabet; anything else passes
/// through unchanged.

/// Rotate uppercase letters back by `shift` positions.
pub fn caesar_decode(text: &str, shift: u8) -> String {
    rotate(text, 26 - shift % 26)
}

/// Alphabet-position subtraction with wrap-around (A=1 .. Z=26).
/// Lowercase input is folded to uppercase first.
pub fn shift_back(text: &str, amount: u8) -> String {
    caesar_decode(&text.to_ascii_uppercase(), amount)
}

/// Read whitespace-separated hex byte pairs as ASCII text.
/// Returns None on any malformed pair or non-ASCII byte.
pub fn hex_to_ascii(hex: &str) -> Option<String> {
    hex.split_whitespace()
        .map(|pair| {
            let byte = u8::from_str_radix(pair, 16).ok()?;
            byte.is_ascii().then_some(byte as char)
        })
        .collect()
}

/// One row of the A-Z reference chart shown with the hex puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartRow {
    pub letter: char,
    pub decimal: u8,
    pub hex: String,
}

pub fn hex_reference_chart() -> Vec<ChartRow> {
    (b'A'..=b'Z')
        .map(|b| ChartRow { letter: b as char, decimal: b, hex: format!("{b:02X}") })
        .collect()
}

fn rotate(text: &str, by: u8) -> String {
    text.chars()
        .map(|c| if c.is_ascii_uppercase() { rotate_char(c, by) } else { c })
        .collect()
}

fn rotate_char(c: char, by: u8) -> char {
    let pos = c as u8 - b'A';
    (b'A' + (pos + by % 26) % 26) as char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caesar_decodes_with_wrap() {
        assert_eq!(caesar_decode("BDAOQQP", 12), "PROCEED");
        assert_eq!(caesar_decode("ABC", 1), "ZAB");
        assert_eq!(caesar_decode("HELLO, WORLD", 0), "HELLO, WORLD");
        assert_eq!(caesar_decode("KHOOR", 29), "HELLO");
    }

    #[test]
    fn lowercase_passes_through_caesar() {
        assert_eq!(caesar_decode("abc", 5), "abc");
    }

    #[test]
    fn shift_back_folds_case() {
        assert_eq!(shift_back("xqorfn", 3), "UNLOCK");
        assert_eq!(shift_back("A", 2), "Y");
    }

    #[test]
    fn hex_to_ascii_reads_pairs() {
        assert_eq!(hex_to_ascii("47 41 54 45 57 41 59").as_deref(), Some("GATEWAY"));
        assert_eq!(hex_to_ascii("zz"), None);
        assert_eq!(hex_to_ascii("FF"), None);
        assert_eq!(hex_to_ascii("").as_deref(), Some(""));
    }

    #[test]
    fn reference_chart_covers_alphabet() {
        let chart = hex_reference_chart();
        assert_eq!(chart.len(), 26);
        assert_eq!(chart[0], ChartRow { letter: 'A', decimal: 65, hex: "41".into() });
        assert_eq!(chart[25].hex, "5A");
    }
}
