use fin_analyzer::infrastructure::text_processing::{join_pages, sanitize_page_text};

#[test]
fn given_hyphenated_line_break_when_sanitizing_then_word_rejoined() {
    assert_eq!(sanitize_page_text("opera-\ntional income"), "operational income");
}

#[test]
fn given_ragged_whitespace_when_sanitizing_then_collapsed() {
    let raw = "  Net   revenue\t\t 10  \n\n\n\n  Total   assets  ";

    assert_eq!(sanitize_page_text(raw), "Net revenue 10\n\nTotal assets");
}

#[test]
fn given_compatibility_characters_when_sanitizing_then_nfkc_normalized() {
    assert_eq!(sanitize_page_text("ﬁnancial"), "financial");
}

#[test]
fn given_control_characters_when_sanitizing_then_removed() {
    assert_eq!(sanitize_page_text("cash\u{0}flow\u{7}"), "cashflow");
}

#[test]
fn given_pages_with_blank_one_when_joining_then_blank_skipped() {
    let joined = join_pages(["Page one", "   \n  ", "Page two"]);

    assert_eq!(joined, "Page one\n\nPage two");
}
