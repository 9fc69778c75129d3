use std::collections::HashMap;
use std::fmt::{self, Write};

use unicode_width::UnicodeWidthStr;

use crate::annotation::Span;
use crate::text::DocumentText;

/// Convert a zero-based index to a base-26 label: A, B, ..., Z, AA, AB, ..., AZ, BA, ...
/// Similar to Excel column naming.
fn index_to_base26_label(mut n: usize) -> String {
    let mut result = String::new();
    loop {
        let remainder = n % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

struct Arrow {
    label: String,
    target: Span,
}

struct Mark {
    span: Span,
    label: String,
    arrows: Vec<Arrow>,
}

/// Underlines annotated spans inside a window of document text.
///
/// ```text
/// knee surgery last week.
///      ╰─────╯ EVENT e1
///        └─BEFORE─>[A]
///                   ╰──╯[A] TIMEX3 t1
/// ```
///
/// Marks whose span is the target of an arrow get a `[A]`, `[B]`, ... tag.
pub struct SpanDisplay<'a> {
    text: &'a DocumentText,
    window: Span,
    marks: Vec<Mark>,
}

impl<'a> SpanDisplay<'a> {
    pub fn new(text: &'a DocumentText, window: Span) -> Self {
        SpanDisplay {
            text,
            window,
            marks: Vec::new(),
        }
    }

    /// A display whose window covers all `spans` plus `context_words` words
    /// on either side.
    pub fn around(text: &'a DocumentText, spans: &[Span], context_words: usize) -> Self {
        let start = spans.iter().map(|span| span.start).min().unwrap_or(0);
        let end = spans.iter().map(|span| span.end).max().unwrap_or(0);
        let window = text.word_window(Span::new(start, end.max(start)), context_words);
        Self::new(text, window)
    }

    /// Width in characters of the text window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn include(&mut self, span: Span, label: impl Into<String>) {
        self.marks.push(Mark {
            span,
            label: label.into(),
            arrows: Vec::new(),
        });
    }

    /// Include a span with an arrow pointing at another span.
    pub fn include_with_arrow(
        &mut self,
        span: Span,
        label: impl Into<String>,
        arrow_label: impl Into<String>,
        target: Span,
    ) {
        self.marks.push(Mark {
            span,
            label: label.into(),
            arrows: vec![Arrow {
                label: arrow_label.into(),
                target,
            }],
        });
    }

    /// Takes self
    pub fn with(mut self, span: Span, label: impl Into<String>) -> Self {
        self.include(span, label);
        self
    }

    /// Takes self, adds an arrow
    pub fn with_arrow(
        mut self,
        span: Span,
        label: impl Into<String>,
        arrow_label: impl Into<String>,
        target: Span,
    ) -> Self {
        self.include_with_arrow(span, label, arrow_label, target);
        self
    }

    /// Labels for included spans that some arrow points at.
    fn build_span_labels(&self) -> HashMap<Span, String> {
        let mut targets: Vec<Span> = self
            .marks
            .iter()
            .flat_map(|mark| &mark.arrows)
            .map(|arrow| arrow.target)
            .filter(|target| self.marks.iter().any(|mark| mark.span == *target))
            .collect();
        targets.sort();
        targets.dedup();

        targets
            .into_iter()
            .enumerate()
            .map(|(i, span)| (span, format!("[{}]", index_to_base26_label(i))))
            .collect()
    }

    fn clamp(&self, offset: usize) -> usize {
        offset.clamp(self.window.start, self.window.end) - self.window.start
    }
}

impl<'a> fmt::Display for SpanDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display column of every character boundary in the window.
        let mut opening_line = String::new();
        let mut columns = vec![0];
        for c in self.text.slice(self.window).chars() {
            opening_line.push(if c.is_whitespace() { ' ' } else { c });
            columns.push(UnicodeWidthStr::width(&*opening_line));
        }
        let column = |offset: usize| columns[self.clamp(offset).min(columns.len() - 1)];

        f.write_str(&opening_line)?;

        let span_labels = self.build_span_labels();

        for mark in &self.marks {
            f.write_char('\n')?;

            let start_char_idx = column(mark.span.start);
            for _ in 0..start_char_idx {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;

            let end_char_idx = column(mark.span.end);
            let char_len = end_char_idx.saturating_sub(start_char_idx);
            for _ in (start_char_idx + 1)..end_char_idx.saturating_sub(1) {
                f.write_char('─')?;
            }

            if char_len > 1 {
                f.write_char('╯')?;
            }

            match span_labels.get(&mark.span) {
                Some(tag) => write!(f, "{} ", tag)?,
                None => f.write_char(' ')?,
            }
            f.write_str(&mark.label)?;

            for arrow in &mark.arrows {
                f.write_char('\n')?;
                for _ in 0..start_char_idx + 2 {
                    f.write_char(' ')?;
                }
                let target = span_labels
                    .get(&arrow.target)
                    .cloned()
                    .unwrap_or_else(|| format!("[{}..{}]", arrow.target.start, arrow.target.end));
                write!(f, "└─{}─>{}", arrow.label, target)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_to_base26_label() {
        assert_eq!(index_to_base26_label(0), "A");
        assert_eq!(index_to_base26_label(25), "Z");
        assert_eq!(index_to_base26_label(26), "AA");
        assert_eq!(index_to_base26_label(51), "AZ");
        assert_eq!(index_to_base26_label(52), "BA");
        assert_eq!(index_to_base26_label(701), "ZZ");
        assert_eq!(index_to_base26_label(702), "AAA");
    }

    #[test]
    fn test_display_with_arrow() {
        let text = DocumentText::new("The patient underwent knee surgery last week.");
        let surgery = Span::new(27, 34);
        let week = Span::new(40, 44);
        let display = SpanDisplay::around(&text, &[surgery, week], 1)
            .with_arrow(surgery, "EVENT e1", "BEFORE", week)
            .with(week, "TIMEX3 t1");

        insta::assert_snapshot!(display.to_string(), @r###"
        knee surgery last week.
             ╰─────╯ EVENT e1
               └─BEFORE─>[A]
                          ╰──╯[A] TIMEX3 t1
        "###);
    }

    #[test]
    fn test_display_newlines_and_wide_chars() {
        let text = DocumentText::new("术后\nrash");
        let display = SpanDisplay::new(&text, Span::new(0, 7))
            .with(Span::new(0, 2), "EVENT")
            .with(Span::new(3, 7), "EVENT");

        insta::assert_snapshot!(display.to_string(), @r###"
        术后 rash
        ╰──╯ EVENT
             ╰──╯ EVENT
        "###);
    }

    #[test]
    fn test_arrow_to_span_outside_display() {
        let text = DocumentText::new("pain resolved");
        let display = SpanDisplay::new(&text, Span::new(0, 13)).with_arrow(
            Span::new(0, 4),
            "EVENT e1",
            "OVERLAP",
            Span::new(100, 104),
        );

        insta::assert_snapshot!(display.to_string(), @r###"
        pain resolved
        ╰──╯ EVENT e1
          └─OVERLAP─>[100..104]
        "###);
    }
}
