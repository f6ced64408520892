use crate::error::Result;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// One line of the input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPage {
    pub name: String,
    pub url: String,
}

impl AuditPage {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// Parses `name,url` lines.
///
/// Both fields are trimmed and lines with an empty field are dropped. A
/// repeated page name keeps its first position but takes the later URL.
pub fn parse_audit_source(content: &str) -> Vec<AuditPage> {
    let mut pages: Vec<AuditPage> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (line_no, line) in content.lines().enumerate() {
        let parsed = line
            .split_once(',')
            .map(|(name, url)| (name.trim(), url.trim()))
            .filter(|(name, url)| !name.is_empty() && !url.is_empty());

        let Some((name, url)) = parsed else {
            if !line.trim().is_empty() {
                debug!("Skipping input line {}: {:?}", line_no + 1, line);
            }
            continue;
        };

        match positions.get(name) {
            Some(&index) => pages[index].url = url.to_string(),
            None => {
                positions.insert(name.to_string(), pages.len());
                pages.push(AuditPage::new(name, url));
            }
        }
    }

    pages
}

pub async fn read_audit_source(path: &Path) -> Result<Vec<AuditPage>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_audit_source(&content))
}

/// Authority segment of an absolute URL: the text between the second and
/// third `/`. Ports and credentials are kept verbatim.
pub fn extract_domain(url: &str) -> Option<&str> {
    url.split('/').nth(2).filter(|domain| !domain.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_incomplete_lines() {
        let content = "home , https://a.test/ \n\
                       \n\
                       about,https://a.test/about\r\n\
                       ,https://a.test/nameless\n\
                       blank-url,\n\
                       no-comma\n";

        assert_eq!(
            parse_audit_source(content),
            vec![
                AuditPage::new("home", "https://a.test/"),
                AuditPage::new("about", "https://a.test/about"),
            ]
        );
    }

    #[test]
    fn test_parse_duplicate_names() {
        let content = "home,https://a.test/\nabout,https://a.test/about\nhome,https://b.test/";

        assert_eq!(
            parse_audit_source(content),
            vec![
                AuditPage::new("home", "https://b.test/"),
                AuditPage::new("about", "https://a.test/about"),
            ]
        );
    }

    #[test]
    fn test_parse_url_with_comma() {
        let pages = parse_audit_source("search,https://a.test/?q=a,b");
        assert_eq!(pages[0].url, "https://a.test/?q=a,b");
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://example.com/page"), Some("example.com"));
        assert_eq!(
            extract_domain("https://example.com:443/other"),
            Some("example.com:443")
        );
        assert_eq!(extract_domain("https://a.test"), Some("a.test"));
        assert_eq!(extract_domain("about:blank"), None);
        assert_eq!(extract_domain("file:///tmp/x.html"), None);
        assert_eq!(extract_domain(""), None);
    }

    #[tokio::test]
    async fn test_read_audit_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        tokio::fs::write(&path, "home,https://a.test/\n").await.unwrap();

        let pages = read_audit_source(&path).await.unwrap();
        assert_eq!(pages, vec![AuditPage::new("home", "https://a.test/")]);

        assert!(read_audit_source(&dir.path().join("missing.csv")).await.is_err());
    }
}
