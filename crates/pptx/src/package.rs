//! The OOXML package: every ZIP entry of a .pptx, kept in archive order.

use quick_xml::events::Event;
use quick_xml::Reader;
use slidetext_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL_TYPE_SUFFIX: &str = "/slide";

/// One entry of the archive.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// All parts of an OOXML package.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Read every entry of the archive into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for idx in 0..archive.len() {
            let mut file = archive
                .by_index(idx)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", idx, e)))?;

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;

            parts.push(Part {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        log::debug!("Read {} package parts", parts.len());
        Ok(Self { parts })
    }

    /// Look up a part by its archive path.
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Read a part as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<&str> {
        let part = self
            .part(name)
            .ok_or_else(|| Error::PptxParseError(format!("File not found in archive '{}'", name)))?;
        std::str::from_utf8(&part.data)
            .map_err(|e| Error::PptxParseError(format!("Failed to read '{}': {}", name, e)))
    }

    /// Write all parts, substituting the data of parts named in `overrides`.
    ///
    /// Entry order and stored/deflated choice follow the source archive.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        overrides: &HashMap<String, Vec<u8>>,
    ) -> Result<W> {
        let mut zip = ZipWriter::new(writer);

        for part in &self.parts {
            let method = match part.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            if part.is_dir {
                zip.add_directory(part.name.as_str(), options)
                    .map_err(|e| Error::ZipError(e.to_string()))?;
                continue;
            }

            let data = overrides.get(&part.name).unwrap_or(&part.data);
            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", part.name, e)))?;
            zip.write_all(data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))
    }

    /// Archive paths of the slides in presentation order.
    ///
    /// The order comes from `p:sldIdLst` in `ppt/presentation.xml`; when that
    /// list is unavailable, slides are ordered by the number in their
    /// relationship id or file name.
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        let relationships = self.slide_relationships()?;

        let listed = match self.part(PRESENTATION_PART) {
            Some(_) => slide_id_list(self.part_str(PRESENTATION_PART)?)?,
            None => Vec::new(),
        };

        if !listed.is_empty() {
            let by_id: HashMap<&str, &str> = relationships
                .iter()
                .map(|(id, target)| (id.as_str(), target.as_str()))
                .collect();

            let mut paths = Vec::with_capacity(listed.len());
            for rel_id in &listed {
                match by_id.get(rel_id.as_str()) {
                    Some(target) => paths.push(resolve_target(target)),
                    None => log::warn!("Slide relationship '{}' not found, skipping", rel_id),
                }
            }
            return Ok(paths);
        }

        log::debug!("No slide id list, ordering slides by relationship number");
        let mut slides: Vec<(String, Option<usize>)> = relationships
            .iter()
            .map(|(id, target)| {
                let order = extract_slide_number(target).or_else(|| extract_slide_number(id));
                (resolve_target(target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// `(Id, Target)` of every slide relationship of the presentation part.
    fn slide_relationships(&self) -> Result<Vec<(String, String)>> {
        let rels_content = self.part_str(PRESENTATION_RELS_PART)?;
        let mut slides = Vec::new();

        let mut reader = Reader::from_str(rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();
                    let mut id = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => {
                                rel_type = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Target" => {
                                target = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            b"Id" => {
                                id = String::from_utf8_lossy(&attr.value).to_string();
                            }
                            _ => {}
                        }
                    }

                    if rel_type.ends_with(SLIDE_REL_TYPE_SUFFIX) {
                        slides.push((id, target));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(slides)
    }
}

/// Relationship ids listed in `p:sldIdLst`, in order.
fn slide_id_list(presentation_xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(presentation_xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The relationship id is the namespaced `r:id`, not the plain `id`.
                let rel_id = e
                    .attributes()
                    .flatten()
                    .find(|attr| {
                        let key = attr.key.as_ref();
                        key != b"id" && local_name(key) == b"id"
                    })
                    .map(|attr| String::from_utf8_lossy(&attr.value).to_string());

                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation part: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Turn a relationship target of the presentation part into an archive path.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
