//! Newline-delimited line decoder.
//!
//! The link delivers bytes in arbitrary fragments: one write may carry
//! half a command, several commands, or a command split mid-digit.  The
//! decoder accumulates bytes and yields each complete line once its `\n`
//! arrives.
//!
//! The buffer is bounded at [`LINE_CAPACITY`].  A line that outgrows it
//! is dropped together with everything up to its terminator, and the
//! terminator then yields [`DecodedLine::TooLong`] so the sender gets an
//! answer instead of silence.

/// Longest accepted line, terminator excluded.
pub const LINE_CAPACITY: usize = 128;

pub type LineBuf = heapless::Vec<u8, LINE_CAPACITY>;

const TERMINATOR: u8 = b'\n';

/// Output of [`LineDecoder::push`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLine {
    /// A complete line, terminator stripped, otherwise untouched.
    Line(LineBuf),
    /// A line exceeded [`LINE_CAPACITY`] and was discarded.
    TooLong,
}

/// Streaming line decoder.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: LineBuf,
    /// Set while skipping the tail of an overlong line.
    discarding: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte.  Returns a line when `byte` terminates one.
    pub fn push(&mut self, byte: u8) -> Option<DecodedLine> {
        if byte == TERMINATOR {
            if self.discarding {
                self.discarding = false;
                return Some(DecodedLine::TooLong);
            }
            return Some(DecodedLine::Line(core::mem::take(&mut self.buf)));
        }

        if self.discarding {
            return None;
        }
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            self.discarding = true;
        }
        None
    }

    /// Feed a fragment, calling `on_line` for every line it completes.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(DecodedLine)) {
        for &byte in data {
            if let Some(line) = self.push(byte) {
                on_line(line);
            }
        }
    }

    /// Bytes held for the next terminator.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial line (e.g. after the link reconnects).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}

/// Strip leading and trailing ASCII whitespace (including `\r`).
pub fn trim_ascii(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(decoder: &mut LineDecoder, data: &[u8]) -> Vec<DecodedLine> {
        let mut out = Vec::new();
        decoder.feed(data, |l| out.push(l));
        out
    }

    fn line(bytes: &[u8]) -> DecodedLine {
        DecodedLine::Line(LineBuf::from_slice(bytes).unwrap())
    }

    #[test]
    fn split_fragments_reassemble() {
        let mut d = LineDecoder::new();
        assert!(collect(&mut d, b"M2").is_empty());
        assert_eq!(d.pending(), 2);
        assert_eq!(collect(&mut d, b"03\nS"), vec![line(b"M203")]);
        assert_eq!(collect(&mut d, b"\n"), vec![line(b"S")]);
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn several_lines_in_one_fragment() {
        let mut d = LineDecoder::new();
        let lines = collect(&mut d, b"S\nT30\n\nM150\n");
        assert_eq!(lines, vec![line(b"S"), line(b"T30"), line(b""), line(b"M150")]);
    }

    #[test]
    fn exactly_capacity_is_accepted() {
        let mut d = LineDecoder::new();
        let mut data = vec![b'x'; LINE_CAPACITY];
        data.push(b'\n');
        let lines = collect(&mut d, &data);
        assert_eq!(lines.len(), 1);
        assert!(matches!(&lines[0], DecodedLine::Line(l) if l.len() == LINE_CAPACITY));
    }

    #[test]
    fn overlong_line_is_discarded_until_terminator() {
        let mut d = LineDecoder::new();
        let data = vec![b'x'; LINE_CAPACITY + 10];
        assert!(collect(&mut d, &data).is_empty());
        assert_eq!(d.pending(), 0);
        // More junk from the same line is still swallowed.
        assert!(collect(&mut d, b"yyyy").is_empty());
        assert_eq!(collect(&mut d, b"\nS\n"), vec![DecodedLine::TooLong, line(b"S")]);
    }

    #[test]
    fn reset_drops_partial_line() {
        let mut d = LineDecoder::new();
        collect(&mut d, b"M10");
        d.reset();
        assert_eq!(collect(&mut d, b"S\n"), vec![line(b"S")]);
    }

    #[test]
    fn trim_handles_crlf_and_blank() {
        assert_eq!(trim_ascii(b"  S\r"), b"S");
        assert_eq!(trim_ascii(b" \t\r"), b"");
        assert_eq!(trim_ascii(b""), b"");
        assert_eq!(trim_ascii(b"M1 50"), b"M1 50");
    }
}
