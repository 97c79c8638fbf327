/// A byte range within one source fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span for tokens and trees with no source text behind them
    /// (wrapper tokens injected by the fragment parser, rendered
    /// placeholder leaves). Synthetic spans carry no position.
    pub fn synthetic() -> Self {
        Self {
            start: u32::MAX,
            end: u32::MAX,
        }
    }

    pub fn is_synthetic(self) -> bool {
        self.start == u32::MAX
    }

    pub fn merge(self, other: Span) -> Span {
        if self.is_synthetic() {
            return other;
        }
        if other.is_synthetic() {
            return self;
        }
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A value annotated with its source span.
#[derive(Clone, Debug)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn synthetic(node: T) -> Self {
        Self {
            node,
            span: Span::synthetic(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ignores_synthetic() {
        let a = Span::new(3, 7);
        assert_eq!(a.merge(Span::synthetic()), a);
        assert_eq!(Span::synthetic().merge(a), a);
        assert_eq!(a.merge(Span::new(1, 5)), Span::new(1, 7));
    }
}
