use std::path::Path;

/// File types the corpus scanner and the document loader know how to read.
pub fn is_supported_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    matches!(ext.as_str(), "txt" | "md" | "pdf" | "docx")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_file(Path::new("acts/rera_2016.txt")));
        assert!(is_supported_file(Path::new("acts/Contract_Act.PDF")));
        assert!(is_supported_file(Path::new("lease.docx")));
        assert!(!is_supported_file(Path::new("index.sqlite3")));
        assert!(!is_supported_file(Path::new("README")));
    }
}
