//! EPUB container and package document
//!
//! Reads `META-INF/container.xml`, the OPF package (metadata, manifest,
//! spine) and the DRM signals carried in `META-INF/`.

use std::collections::HashMap;
use std::io::{Read, Seek};

use zip::ZipArchive;

use super::parse_xml;
use crate::document::{DocumentError, DocumentResult};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const ENCRYPTION_PATH: &str = "META-INF/encryption.xml";
const RIGHTS_PATH: &str = "META-INF/rights.xml";

/// Encryption algorithms used for font obfuscation only (not DRM)
const FONT_OBFUSCATION_ALGORITHMS: &[&str] = &[
    "http://www.idpf.org/2008/embedding",
    "http://ns.adobe.com/pdf/enc#RC",
];

const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// Dublin Core metadata of interest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub title: Option<String>,
    /// First `dc:creator`
    pub author: Option<String>,
    pub rights: Option<String>,
}

/// Manifest entry with its href resolved to an archive path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub path: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_whitespace().any(|p| p == property))
    }
}

/// Parsed OPF package
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Directory of the OPF file inside the archive, without trailing slash
    pub opf_dir: String,
    pub metadata: PackageMetadata,
    pub manifest: HashMap<String, ManifestItem>,
    /// Spine in reading order
    pub spine: Vec<ManifestItem>,
    /// Manifest id named by `spine@toc`
    pub toc_id: Option<String>,
}

/// Location of the navigation document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocSource {
    /// EPUB 3 navigation document
    Nav(String),
    /// EPUB 2 NCX
    Ncx(String),
}

impl Package {
    /// Read container.xml and the OPF it points to
    pub fn read<R: Read + Seek>(archive: &mut ZipArchive<R>) -> DocumentResult<Self> {
        let opf_path = find_opf_path(archive)?;
        let opf_dir = parent_dir(&opf_path).to_string();
        let opf = read_entry(archive, &opf_path)?;

        Self::parse(&opf, &opf_dir)
    }

    /// Parse OPF text whose hrefs are relative to `opf_dir`
    pub fn parse(opf: &str, opf_dir: &str) -> DocumentResult<Self> {
        let doc = parse_xml(opf)?;
        let mut package = Package {
            opf_dir: opf_dir.to_string(),
            ..Default::default()
        };

        for node in doc.descendants().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "title" if package.metadata.title.is_none() => {
                    package.metadata.title = non_empty_text(node);
                }
                "creator" if package.metadata.author.is_none() => {
                    package.metadata.author = non_empty_text(node);
                }
                "rights" if package.metadata.rights.is_none() => {
                    package.metadata.rights = non_empty_text(node);
                }
                "item" => {
                    let (Some(id), Some(href)) = (node.attribute("id"), node.attribute("href"))
                    else {
                        continue;
                    };
                    package.manifest.insert(
                        id.to_string(),
                        ManifestItem {
                            id: id.to_string(),
                            path: resolve_href(opf_dir, href),
                            media_type: node.attribute("media-type").unwrap_or_default().to_string(),
                            properties: node.attribute("properties").map(str::to_string),
                        },
                    );
                }
                "spine" => {
                    package.toc_id = node.attribute("toc").map(str::to_string);
                }
                _ => {}
            }
        }

        // Spine after the manifest so idrefs resolve regardless of element order
        for itemref in doc
            .descendants()
            .filter(|n| n.tag_name().name() == "itemref")
        {
            let Some(idref) = itemref.attribute("idref") else {
                continue;
            };
            match package.manifest.get(idref) {
                Some(item) => package.spine.push(item.clone()),
                None => tracing::warn!("Spine references unknown manifest item '{}'", idref),
            }
        }

        Ok(package)
    }

    /// Navigation document to read, preferring EPUB 3 nav over NCX
    pub fn toc_source(&self) -> Option<TocSource> {
        if let Some(nav) = self.manifest.values().find(|item| item.has_property("nav")) {
            return Some(TocSource::Nav(nav.path.clone()));
        }

        self.toc_id
            .as_deref()
            .and_then(|id| self.manifest.get(id))
            .or_else(|| {
                self.manifest
                    .values()
                    .find(|item| item.media_type == NCX_MEDIA_TYPE)
            })
            .map(|item| TocSource::Ncx(item.path.clone()))
    }
}

/// Check every DRM signal; returns the reason when one fires
pub fn detect_drm<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    metadata: &PackageMetadata,
) -> Option<String> {
    if let Some(rights) = &metadata.rights {
        let lower = rights.to_lowercase();
        if lower.contains("drm") || lower.contains("adobe") {
            return Some(format!("Rights metadata: {}", rights));
        }
    }

    if has_entry(archive, RIGHTS_PATH) {
        return Some(format!("{} present", RIGHTS_PATH));
    }

    if has_entry(archive, ENCRYPTION_PATH) {
        return match read_entry(archive, ENCRYPTION_PATH) {
            Ok(xml) => encrypted_resource(&xml),
            Err(e) => Some(format!("Unreadable {}: {}", ENCRYPTION_PATH, e)),
        };
    }

    None
}

fn has_entry<R: Read + Seek>(archive: &ZipArchive<R>, path: &str) -> bool {
    archive.file_names().any(|name| name == path)
}

/// First resource encrypted with something other than font obfuscation
fn encrypted_resource(encryption_xml: &str) -> Option<String> {
    let doc = match parse_xml(encryption_xml) {
        Ok(doc) => doc,
        Err(e) => return Some(format!("Unreadable {}: {}", ENCRYPTION_PATH, e)),
    };

    doc.descendants()
        .filter(|n| n.tag_name().name() == "EncryptedData")
        .find_map(|data| {
            let algorithm = data
                .descendants()
                .find(|n| n.tag_name().name() == "EncryptionMethod")
                .and_then(|n| n.attribute("Algorithm"))
                .unwrap_or_default();

            if FONT_OBFUSCATION_ALGORITHMS.contains(&algorithm) {
                return None;
            }

            let uri = data
                .descendants()
                .find(|n| n.tag_name().name() == "CipherReference")
                .and_then(|n| n.attribute("URI"))
                .unwrap_or("unknown resource");
            Some(format!("Encrypted resource: {}", uri))
        })
}

fn find_opf_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> DocumentResult<String> {
    let container = read_entry(archive, CONTAINER_PATH)?;
    let doc = parse_xml(&container)?;

    doc.descendants()
        .find(|n| n.tag_name().name() == "rootfile")
        .and_then(|n| n.attribute("full-path"))
        .map(str::to_string)
        .ok_or_else(|| {
            DocumentError::InvalidEpub("Could not find OPF path in container.xml".to_string())
        })
}

/// Read an archive entry as UTF-8 text
pub fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> DocumentResult<String> {
    let mut file = archive.by_name(path)?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;

    String::from_utf8(bytes)
        .map_err(|e| DocumentError::InvalidEpub(format!("{} is not valid UTF-8: {}", path, e)))
}

/// Directory part of an archive path (`OEBPS/text/ch1.xhtml` -> `OEBPS/text`)
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or_default()
}

/// Resolve an href against a base directory into an archive path
///
/// The fragment is dropped, percent-escapes are decoded and `.`/`..`
/// segments are collapsed.
pub fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string());

    let mut segments: Vec<&str> = if decoded.starts_with('/') {
        Vec::new()
    } else {
        base_dir.split('/').filter(|s| !s.is_empty()).collect()
    };

    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

fn non_empty_text(node: roxmltree::Node) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title> Test Book </dc:title>
    <dc:creator>First Author</dc:creator>
    <dc:creator>Second Author</dc:creator>
  </metadata>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="missing"/>
    <itemref idref="ch2"/>
  </spine>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="ch1" href="text/chapter%201.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/chapter2.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
</package>"#;

    #[test]
    fn test_parse_package() {
        let package = Package::parse(OPF, "OEBPS").unwrap();

        assert_eq!(package.metadata.title.as_deref(), Some("Test Book"));
        assert_eq!(package.metadata.author.as_deref(), Some("First Author"));
        assert_eq!(package.metadata.rights, None);

        let spine: Vec<&str> = package.spine.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            spine,
            vec!["OEBPS/text/chapter 1.xhtml", "OEBPS/text/chapter2.xhtml"]
        );
    }

    #[test]
    fn test_nav_preferred_over_ncx() {
        let package = Package::parse(OPF, "OEBPS").unwrap();
        assert_eq!(
            package.toc_source(),
            Some(TocSource::Nav("OEBPS/nav.xhtml".to_string()))
        );

        let epub2 = OPF.replace(r#" properties="nav""#, "");
        let package = Package::parse(&epub2, "OEBPS").unwrap();
        assert_eq!(
            package.toc_source(),
            Some(TocSource::Ncx("OEBPS/toc.ncx".to_string()))
        );
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(resolve_href("OEBPS", "ch1.xhtml#sec2"), "OEBPS/ch1.xhtml");
        assert_eq!(resolve_href("OEBPS/nav", "../text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve_href("", "./a%20b.xhtml"), "a b.xhtml");
        assert_eq!(resolve_href("OEBPS", "/root.xhtml"), "root.xhtml");
    }

    #[test]
    fn test_font_obfuscation_is_not_drm() {
        let xml = r#"<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container"
            xmlns:enc="http://www.w3.org/2001/04/xmlenc#">
          <enc:EncryptedData>
            <enc:EncryptionMethod Algorithm="http://www.idpf.org/2008/embedding"/>
            <enc:CipherData><enc:CipherReference URI="fonts/a.otf"/></enc:CipherData>
          </enc:EncryptedData>
        </encryption>"#;
        assert_eq!(encrypted_resource(xml), None);
    }

    #[test]
    fn test_encrypted_content_is_drm() {
        let xml = r#"<encryption xmlns="urn:oasis:names:tc:opendocument:xmlns:container"
            xmlns:enc="http://www.w3.org/2001/04/xmlenc#">
          <enc:EncryptedData>
            <enc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#aes128-cbc"/>
            <enc:CipherData><enc:CipherReference URI="OEBPS/ch1.xhtml"/></enc:CipherData>
          </enc:EncryptedData>
        </encryption>"#;
        assert_eq!(
            encrypted_resource(xml).as_deref(),
            Some("Encrypted resource: OEBPS/ch1.xhtml")
        );
    }
}
