/// Document formats the analyzer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Pdf,
}

impl ContentType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.split(';').next().map(str::trim) {
            Some("application/pdf") => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        if extension.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else {
            None
        }
    }

    /// A file extension decides on its own; the declared MIME type is only
    /// consulted for names without one.
    pub fn detect(filename: &str, mime: Option<&str>) -> Option<Self> {
        if filename.contains('.') {
            Self::from_filename(filename)
        } else {
            mime.and_then(Self::from_mime)
        }
    }
}
