//! Output filename sanitizing

/// Characters replaced before a user-supplied name is used for a download.
const RESERVED: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace path separators, filesystem-special and control characters with
/// `_` and make sure the name ends in `.pdf`. Falls back to `fallback` when
/// nothing usable is left.
pub fn sanitize_filename(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let base = if cleaned.trim_matches(|c| c == '_' || c == '.').is_empty() {
        fallback.to_string()
    } else {
        cleaned
    };

    if base.to_ascii_lowercase().ends_with(".pdf") {
        base
    } else {
        format!("{}.pdf", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_gets_extension() {
        assert_eq!(sanitize_filename("report", "out.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("report.PDF", "out.pdf"), "report.PDF");
    }

    #[test]
    fn test_separators_and_specials_replaced() {
        assert_eq!(
            sanitize_filename("../etc/pass:wd?.pdf", "out.pdf"),
            ".._etc_pass_wd_.pdf"
        );
        assert_eq!(sanitize_filename("a\\b|c\"d", "out.pdf"), "a_b_c_d.pdf");
        assert_eq!(sanitize_filename("tab\there", "out.pdf"), "tab_here.pdf");
    }

    #[test]
    fn test_empty_or_junk_falls_back() {
        assert_eq!(sanitize_filename("", "merged.pdf"), "merged.pdf");
        assert_eq!(sanitize_filename("   ", "merged.pdf"), "merged.pdf");
        assert_eq!(sanitize_filename("//", "merged"), "merged.pdf");
    }
}
