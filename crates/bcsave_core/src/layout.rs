use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionId {
    Chapters,
    TreasureFestival,
    ItfTimedScores,
    Tail,
}

impl SectionId {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Chapters => "story chapters",
            Self::TreasureFestival => "treasure festival",
            Self::ItfTimedScores => "timed scores",
            Self::Tail => "trailing data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("file layout must contain at least one section")]
    Empty,
    #[error("layout gap/overlap around section {id:?}: expected start {expected}, got {found}")]
    Discontiguous {
        id: SectionId,
        expected: usize,
        found: usize,
    },
    #[error("invalid section range {id:?}: {start}..{end}")]
    InvertedRange {
        id: SectionId,
        start: usize,
        end: usize,
    },
    #[error("layout does not cover file: ended at {ended}, file length {file_len}")]
    Uncovered { ended: usize, file_len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.sections.is_empty() {
            return Err(LayoutError::Empty);
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(LayoutError::Discontiguous {
                    id: section.id,
                    expected,
                    found: section.range.start,
                });
            }
            if section.range.end < section.range.start {
                return Err(LayoutError::InvertedRange {
                    id: section.id,
                    start: section.range.start,
                    end: section.range.end,
                });
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(LayoutError::Uncovered {
                ended: expected,
                file_len: self.file_len,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: SectionId, start: usize, end: usize) -> SectionLayout {
        SectionLayout {
            id,
            range: ByteRange { start, end },
        }
    }

    #[test]
    fn contiguous_layout_validates() {
        let layout = FileLayout {
            file_len: 12,
            sections: vec![
                section(SectionId::Chapters, 0, 8),
                section(SectionId::Tail, 8, 12),
            ],
        };
        assert_eq!(layout.validate(), Ok(()));
        assert_eq!(layout.section(SectionId::Tail).map(|s| s.range.len()), Some(4));
    }

    #[test]
    fn gaps_and_short_coverage_are_rejected() {
        let gap = FileLayout {
            file_len: 12,
            sections: vec![
                section(SectionId::Chapters, 0, 8),
                section(SectionId::Tail, 9, 12),
            ],
        };
        assert!(matches!(
            gap.validate(),
            Err(LayoutError::Discontiguous { expected: 8, found: 9, .. })
        ));

        let short = FileLayout {
            file_len: 12,
            sections: vec![section(SectionId::Chapters, 0, 8)],
        };
        assert_eq!(
            short.validate(),
            Err(LayoutError::Uncovered {
                ended: 8,
                file_len: 12
            })
        );
        assert_eq!(
            FileLayout {
                file_len: 0,
                sections: Vec::new()
            }
            .validate(),
            Err(LayoutError::Empty)
        );
    }
}
