use fin_analyzer::domain::ContentType;

#[test]
fn given_pdf_extension_when_detecting_then_pdf_regardless_of_case() {
    assert_eq!(ContentType::detect("Report.PDF", None), Some(ContentType::Pdf));
    assert_eq!(
        ContentType::detect("report.pdf", Some("application/octet-stream")),
        Some(ContentType::Pdf)
    );
}

#[test]
fn given_other_extension_when_detecting_then_rejected_even_with_pdf_mime() {
    assert_eq!(
        ContentType::detect("notes.txt", Some("application/pdf")),
        None
    );
}

#[test]
fn given_no_extension_when_detecting_then_mime_decides() {
    assert_eq!(
        ContentType::detect("scan", Some("application/pdf; charset=binary")),
        Some(ContentType::Pdf)
    );
    assert_eq!(ContentType::detect("scan", Some("image/png")), None);
    assert_eq!(ContentType::detect("scan", None), None);
}
