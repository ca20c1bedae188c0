pub type FileId = u64;

/// Half-open byte range `[lo, hi)` into a registered source file.
///
/// Ranges coming from the host compiler are token ranges that have already been widened to cover
/// the last token, so `hi` is exclusive. File id 0 is reserved for [`Span::null`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub file: FileId,
    pub lo: u32,
    pub hi: u32,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return write!(f, "Span(<invalid>)");
        }
        write!(f, "Span({}:{}-{})", self.file, self.lo, self.hi)
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::null()
    }
}

impl Span {
    pub fn new(file: FileId, lo: u32, hi: u32) -> Span {
        Span { file, lo, hi }
    }

    /// The invalid range. Nodes synthesized by the host or expanded from macros carry it.
    pub const fn null() -> Span {
        Span {
            file: 0,
            lo: 0,
            hi: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.file == 0
    }

    pub fn is_valid(&self) -> bool {
        !self.is_null() && self.lo <= self.hi
    }

    pub fn len(&self) -> u32 {
        self.hi.saturating_sub(self.lo)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty range at the start of `self`; the anchor of an insertion.
    pub fn shrink_to_lo(&self) -> Span {
        Span::new(self.file, self.lo, self.lo)
    }

    pub fn to(&self, end: Span) -> Span {
        if self.is_null() || end.is_null() || self.file != end.file {
            return Span::null();
        }
        Span::new(self.file, self.lo.min(end.lo), self.hi.max(end.hi))
    }

    pub fn contains(&self, other: Span) -> bool {
        self.file == other.file && self.lo <= other.lo && other.hi <= self.hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_span_is_invalid() {
        assert!(Span::null().is_null());
        assert!(!Span::null().is_valid());
        assert!(!Span::new(1, 5, 3).is_valid());
        assert!(Span::new(1, 3, 3).is_valid());
    }

    #[test]
    fn joining_spans_from_different_files_is_null() {
        let a = Span::new(1, 0, 4);
        assert_eq!(a.to(Span::new(1, 6, 9)), Span::new(1, 0, 9));
        assert!(a.to(Span::new(2, 6, 9)).is_null());
    }
}
