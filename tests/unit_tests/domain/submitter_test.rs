use fin_analyzer::domain::{InvalidEmail, Submitter};

#[test]
fn given_no_identity_when_parsing_then_none() {
    assert_eq!(Submitter::parse(None, None).unwrap(), None);
    assert_eq!(Submitter::parse(Some("  "), Some("")).unwrap(), None);
}

#[test]
fn given_mixed_case_email_when_parsing_then_trimmed_and_lowercased() {
    let submitter = Submitter::parse(Some(" Ada "), Some("  Ada@Example.COM "))
        .unwrap()
        .unwrap();

    assert_eq!(submitter.name(), Some("Ada"));
    assert_eq!(submitter.email(), Some("ada@example.com"));
}

#[test]
fn given_email_without_at_sign_when_parsing_then_invalid() {
    let err = Submitter::parse(None, Some("not-an-email")).unwrap_err();

    assert_eq!(err, InvalidEmail("not-an-email".to_string()));
}

#[test]
fn given_name_only_when_parsing_then_submitter_without_email() {
    let submitter = Submitter::parse(Some("Grace"), None).unwrap().unwrap();

    assert_eq!(submitter.name(), Some("Grace"));
    assert_eq!(submitter.email(), None);
}
