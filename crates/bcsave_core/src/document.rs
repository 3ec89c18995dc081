use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::{ByteRange, FileLayout, LayoutError, SectionId, SectionLayout};
use crate::story::{self, StoryChapters};
use crate::stream::{ByteStream, DecodeError};

/// Which optional field blocks follow the base chapter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StoryFormat {
    pub treasure_festival: bool,
    pub itf_timed_scores: bool,
}

impl StoryFormat {
    pub const BASE: Self = Self {
        treasure_festival: false,
        itf_timed_scores: false,
    };

    pub const ALL: [Self; 4] = [
        Self::BASE,
        Self {
            treasure_festival: true,
            itf_timed_scores: false,
        },
        Self {
            treasure_festival: false,
            itf_timed_scores: true,
        },
        Self {
            treasure_festival: true,
            itf_timed_scores: true,
        },
    ];

    pub fn sections(&self) -> Vec<SectionId> {
        let mut sections = vec![SectionId::Chapters];
        if self.treasure_festival {
            sections.push(SectionId::TreasureFestival);
        }
        if self.itf_timed_scores {
            sections.push(SectionId::ItfTimedScores);
        }
        sections
    }

    pub fn section_len(id: SectionId) -> usize {
        match id {
            SectionId::Chapters => story::passes::encoded_len(story::BASE_PASSES),
            SectionId::TreasureFestival => {
                story::passes::encoded_len(story::TREASURE_FESTIVAL_PASSES)
            }
            SectionId::ItfTimedScores => story::passes::encoded_len(story::ITF_TIMED_SCORE_PASSES),
            SectionId::Tail => 0,
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.sections().into_iter().map(Self::section_len).sum()
    }

    /// The format whose encoded length is exactly `len`, if any.
    pub fn detect(len: usize) -> Option<Self> {
        let mut matches = Self::ALL.into_iter().filter(|f| f.encoded_len() == len);
        let format = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(format),
        }
    }

    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.sections().iter().map(SectionId::as_str).collect();
        names.join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("failed to decode {}: {source}", section.as_str())]
    Section {
        section: SectionId,
        #[source]
        source: DecodeError,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("{mode} emit length mismatch: got {got}, expected {expected}")]
    EmitLength {
        mode: &'static str,
        got: usize,
        expected: usize,
    },
}

/// A decoded story block together with the byte ranges it was read from.
#[derive(Debug, Clone)]
pub struct StoryDocument {
    pub story: StoryChapters,
    format: StoryFormat,
    layout: FileLayout,
    tail: Vec<u8>,
    original: Vec<u8>,
}

struct Capture {
    sections: Vec<SectionLayout>,
}

impl Capture {
    fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    fn record(&mut self, id: SectionId, start: usize, end: usize) {
        self.sections.push(SectionLayout {
            id,
            range: ByteRange { start, end },
        });
    }
}

impl StoryDocument {
    pub fn parse_with_layout(bytes: &[u8], format: StoryFormat) -> Result<Self, DocumentError> {
        let mut stream = ByteStream::from_bytes(bytes);
        let mut capture = Capture::new();
        let mut story = StoryChapters::new();

        for id in format.sections() {
            let start = stream.position();
            decode_section(&mut story, id, &mut stream)
                .map_err(|source| DocumentError::Section { section: id, source })?;
            debug!(
                section = id.as_str(),
                start,
                end = stream.position(),
                "decoded section"
            );
            capture.record(id, start, stream.position());
        }

        let consumed = stream.position();
        let file_len = bytes.len();
        if consumed < file_len {
            capture.record(SectionId::Tail, consumed, file_len);
        }

        let layout = FileLayout {
            file_len,
            sections: capture.sections,
        };
        layout.validate()?;

        info!(
            format = %format.describe(),
            file_len,
            tail_len = file_len - consumed,
            "loaded story document"
        );

        Ok(Self {
            story,
            format,
            layout,
            tail: bytes[consumed..].to_vec(),
            original: bytes.to_vec(),
        })
    }

    pub fn format(&self) -> StoryFormat {
        self.format
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    /// Bytes after the last decoded section, carried through unchanged.
    pub fn tail(&self) -> &[u8] {
        &self.tail
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.original.clone()
    }

    pub fn to_bytes_modified(&self) -> Result<Vec<u8>, DocumentError> {
        let mut stream = ByteStream::new();
        for id in self.format.sections() {
            encode_section(&self.story, id, &mut stream);
        }
        stream.write_bytes(&self.tail);

        let out = stream.into_bytes();
        if out.len() != self.layout.file_len {
            return Err(DocumentError::EmitLength {
                mode: "modified",
                got: out.len(),
                expected: self.layout.file_len,
            });
        }

        info!(len = out.len(), "encoded story document");
        Ok(out)
    }
}

fn decode_section(
    story: &mut StoryChapters,
    id: SectionId,
    stream: &mut ByteStream,
) -> Result<(), DecodeError> {
    match id {
        SectionId::Chapters => {
            *story = StoryChapters::read(stream)?;
            Ok(())
        }
        SectionId::TreasureFestival => story.read_treasure_festival(stream),
        SectionId::ItfTimedScores => story.read_itf_timed_scores(stream),
        SectionId::Tail => Ok(()),
    }
}

fn encode_section(story: &StoryChapters, id: SectionId, stream: &mut ByteStream) {
    match id {
        SectionId::Chapters => story.write(stream),
        SectionId::TreasureFestival => story.write_treasure_festival(stream),
        SectionId::ItfTimedScores => story.write_itf_timed_scores(stream),
        SectionId::Tail => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_lengths_add_up_per_format() {
        let lens: Vec<usize> = StoryFormat::ALL.iter().map(|f| f.encoded_len()).collect();
        assert_eq!(lens, vec![4080, 4280, 4692, 4892]);
    }

    #[test]
    fn detect_matches_exact_lengths_only() {
        for format in StoryFormat::ALL {
            assert_eq!(StoryFormat::detect(format.encoded_len()), Some(format));
        }
        assert_eq!(StoryFormat::detect(4081), None);
        assert_eq!(StoryFormat::detect(0), None);
    }

    #[test]
    fn truncated_input_names_the_failing_section() {
        let bytes = vec![0u8; 4080 + 100];
        let format = StoryFormat {
            treasure_festival: true,
            itf_timed_scores: false,
        };
        let err = StoryDocument::parse_with_layout(&bytes, format).expect_err("short festival block");
        assert!(matches!(
            err,
            DocumentError::Section {
                section: SectionId::TreasureFestival,
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to decode treasure festival"));
    }

    #[test]
    fn trailing_bytes_become_tail_section() {
        let mut bytes = vec![0u8; 4080];
        bytes.extend_from_slice(&[1, 2, 3]);
        let doc = StoryDocument::parse_with_layout(&bytes, StoryFormat::BASE).expect("parse");
        assert_eq!(doc.tail(), &[1, 2, 3]);
        let tail = doc.layout().section(SectionId::Tail).expect("tail recorded");
        assert_eq!(tail.range, ByteRange { start: 4080, end: 4083 });
        assert_eq!(doc.to_bytes_modified().expect("emit"), bytes);
    }
}
