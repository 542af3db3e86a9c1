//! ZIP bundling of successful outputs

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};

use crate::config::{ArchiveCompression, ArchiveConfig, FileCollisionAction};
use crate::error::{Error, Result, ValidationError};
use crate::types::ProcessedImage;
use crate::utils::reserve_unique_name;

/// Packs processed images into a single in-memory ZIP archive
#[derive(Clone, Debug)]
pub struct ArchiveBuilder {
    filename: String,
    collision: FileCollisionAction,
    compression: ArchiveCompression,
}

impl ArchiveBuilder {
    /// Create a builder from the archive settings
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            filename: config.filename.clone(),
            collision: config.collision,
            compression: config.compression,
        }
    }

    /// Filename the archive should be offered under
    pub fn archive_filename(&self) -> &str {
        &self.filename
    }

    /// Build the archive. Entries keep input order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateFilename`] when two images share a name
    /// under [`FileCollisionAction::Reject`], or [`Error::Archive`] if writing fails.
    pub fn build(&self, images: &[ProcessedImage]) -> Result<Vec<u8>> {
        let entries = self.resolve_entry_names(images)?;

        let options = zip::write::FileOptions::default().compression_method(
            match self.compression {
                ArchiveCompression::Deflated => zip::CompressionMethod::Deflated,
                ArchiveCompression::Stored => zip::CompressionMethod::Stored,
            },
        );

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &entries {
            tracing::debug!(entry = %name, bytes = data.len(), "adding archive entry");
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        let archive = writer.finish()?.into_inner();

        tracing::debug!(
            entries = entries.len(),
            bytes = archive.len(),
            archive = %self.filename,
            "archive built"
        );
        Ok(archive)
    }

    /// Entry name for every image that makes it into the archive
    fn resolve_entry_names<'a>(
        &self,
        images: &'a [ProcessedImage],
    ) -> Result<Vec<(String, &'a [u8])>> {
        match self.collision {
            FileCollisionAction::Rename => {
                // Reserve every original name first so a renamed duplicate never
                // takes the name of a later original
                let mut taken: HashSet<String> =
                    images.iter().map(|i| i.filename.clone()).collect();
                let mut seen = HashSet::with_capacity(images.len());
                images
                    .iter()
                    .map(|image| -> Result<(String, &'a [u8])> {
                        let name = if seen.insert(image.filename.as_str()) {
                            image.filename.clone()
                        } else {
                            let renamed = reserve_unique_name(&image.filename, &mut taken)
                                .ok_or_else(|| ValidationError::DuplicateFilename {
                                    filename: image.filename.clone(),
                                })?;
                            tracing::debug!(
                                from = %image.filename,
                                to = %renamed,
                                "renamed duplicate archive entry"
                            );
                            renamed
                        };
                        Ok((name, image.data.as_slice()))
                    })
                    .collect()
            }
            FileCollisionAction::Overwrite => {
                let last_index: HashMap<&str, usize> = images
                    .iter()
                    .enumerate()
                    .map(|(idx, image)| (image.filename.as_str(), idx))
                    .collect();
                Ok(images
                    .iter()
                    .enumerate()
                    .filter(|(idx, image)| last_index.get(image.filename.as_str()) == Some(idx))
                    .map(|(_, image)| (image.filename.clone(), image.data.as_slice()))
                    .collect())
            }
            FileCollisionAction::Reject => {
                let mut seen = HashSet::with_capacity(images.len());
                images
                    .iter()
                    .map(|image| {
                        if seen.insert(image.filename.as_str()) {
                            Ok((image.filename.clone(), image.data.as_slice()))
                        } else {
                            Err(Error::Validation(ValidationError::DuplicateFilename {
                                filename: image.filename.clone(),
                            }))
                        }
                    })
                    .collect()
            }
        }
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new(&ArchiveConfig::default())
    }
}

/// Read every file entry of a ZIP archive as `(name, bytes)`, in archive order
pub fn read_entries(archive: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;
    let mut entries = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut file = zip.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        entries.push((file.name().to_string(), data));
    }
    Ok(entries)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str, data: &[u8]) -> ProcessedImage {
        ProcessedImage {
            filename: name.to_string(),
            data: data.to_vec(),
            content_type: "image/jpeg".to_string(),
        }
    }

    fn builder(collision: FileCollisionAction) -> ArchiveBuilder {
        ArchiveBuilder::new(&ArchiveConfig {
            collision,
            ..Default::default()
        })
    }

    #[test]
    fn every_entry_round_trips_byte_identical() {
        let images = vec![
            image("a.jpg", b"first image"),
            image("b.jpg", &[0u8, 255, 1, 254]),
            image("c.jpg", &vec![42u8; 10_000]),
        ];

        let archive = ArchiveBuilder::default().build(&images).unwrap();
        let entries = read_entries(&archive).unwrap();

        assert_eq!(entries.len(), 3);
        for (image, (name, data)) in images.iter().zip(&entries) {
            assert_eq!(&image.filename, name);
            assert_eq!(&image.data, data);
        }
    }

    #[test]
    fn stored_compression_round_trips() {
        let builder = ArchiveBuilder::new(&ArchiveConfig {
            compression: ArchiveCompression::Stored,
            ..Default::default()
        });
        let archive = builder.build(&[image("x.png", b"raw")]).unwrap();
        assert_eq!(
            read_entries(&archive).unwrap(),
            vec![("x.png".to_string(), b"raw".to_vec())]
        );
    }

    #[test]
    fn rename_keeps_every_payload() {
        let images = vec![
            image("dup.jpg", b"one"),
            image("dup.jpg", b"two"),
            image("dup (1).jpg", b"three"),
        ];
        let archive = builder(FileCollisionAction::Rename).build(&images).unwrap();
        let entries = read_entries(&archive).unwrap();

        assert_eq!(
            entries,
            vec![
                ("dup.jpg".to_string(), b"one".to_vec()),
                ("dup (2).jpg".to_string(), b"two".to_vec()),
                ("dup (1).jpg".to_string(), b"three".to_vec()),
            ]
        );
    }

    #[test]
    fn overwrite_keeps_the_last_payload_once() {
        let images = vec![
            image("dup.jpg", b"old"),
            image("other.jpg", b"x"),
            image("dup.jpg", b"new"),
        ];
        let archive = builder(FileCollisionAction::Overwrite)
            .build(&images)
            .unwrap();

        assert_eq!(
            read_entries(&archive).unwrap(),
            vec![
                ("other.jpg".to_string(), b"x".to_vec()),
                ("dup.jpg".to_string(), b"new".to_vec()),
            ]
        );
    }

    #[test]
    fn reject_refuses_duplicates() {
        let images = vec![image("dup.jpg", b"1"), image("dup.jpg", b"2")];
        let err = builder(FileCollisionAction::Reject)
            .build(&images)
            .unwrap_err();
        assert_eq!(err.error_code(), "duplicate_filename");
    }

    #[test]
    fn empty_input_produces_a_valid_empty_archive() {
        let archive = ArchiveBuilder::default().build(&[]).unwrap();
        assert!(read_entries(&archive).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let err = read_entries(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }
}
