//! A two-buffer UTF-8 rune reader.
//!
//! The reader owns a buffer of `2 * N` bytes split into a low half `[0, N)`
//! and a high half `[N, 2N)`. When the forward pointer reaches the end of one
//! half, the other half is refilled from the byte source right before its
//! first byte is read, so a pending lexeme stays addressable as long as it
//! spans at most `N` bytes. A refill that would overwrite a longer lexeme
//! fails with [`InputError::LexemeTooLong`] instead.
use std::io::{self, Read};

use tracing::{debug, trace};

use crate::InputError;

/// Half size used by [`Input::with_default_size`], a disk block.
pub const DEFAULT_HALF_SIZE: usize = 4096;

/// Sentinel written right after the last byte of a short read.
const EOF: u8 = 0x00;

/// Marks a byte that cannot start a UTF-8 sequence.
const INVALID: u8 = 0xFF;

/// Accepted range of the second byte of a sequence, indexed by the high
/// nibble of the start byte's class. Later continuation bytes always use the
/// first range.
const ACCEPT_RANGES: [(u8, u8); 5] = [
    (0x80, 0xBF),
    // E0: no overlong 3-byte sequences
    (0xA0, 0xBF),
    // ED: no surrogates
    (0x80, 0x9F),
    // F0: no overlong 4-byte sequences
    (0x90, 0xBF),
    // F4: nothing above U+10FFFF
    (0x80, 0x8F),
];

/// Class of every first byte: low nibble is the sequence size, high nibble
/// the index of its second-byte range.
static FIRST: [u8; 256] = first_byte_classes();

const fn first_byte_classes() -> [u8; 256] {
    let mut classes = [INVALID; 256];
    let mut b = 0;

    while b < 256 {
        classes[b] = match b as u8 {
            0x00..=0x7F => 0x01,
            0xC2..=0xDF => 0x02,
            0xE0 => 0x13,
            0xE1..=0xEC | 0xEE..=0xEF => 0x03,
            0xED => 0x23,
            0xF0 => 0x34,
            0xF1..=0xF3 => 0x04,
            0xF4 => 0x44,
            _ => INVALID,
        };
        b += 1;
    }

    classes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Low,
    High,
}

impl Half {
    fn offset(self, size: usize) -> usize {
        match self {
            Half::Low => 0,
            Half::High => size,
        }
    }
}

/// Why the reader stopped producing runes.
#[derive(Debug, Clone)]
enum Halt {
    Eof,
    Failed(InputError),
}

/// A buffered rune source with one-rune retraction and lexeme capture.
pub struct Input<R> {
    source: R,
    buffer: Box<[u8]>,
    /// Size of one half of the buffer.
    half: usize,
    lexeme_begin: usize,
    forward: usize,
    /// Index of the sentinel closing the data, once the source is drained.
    end: Option<usize>,
    /// The half that was filled last.
    loaded: Option<Half>,
    /// Runes already surrendered through `lexeme` or `skip`.
    runes_consumed: usize,
    /// Byte sizes of the runes between `lexeme_begin` and `forward`.
    rune_sizes: Vec<u8>,
    /// Bytes read since `lexeme_begin`, including a partly decoded rune.
    lexeme_bytes: usize,
    /// Error raised by a reload, reported once the bytes before it are read.
    pending: Option<InputError>,
    halt: Option<Halt>,
}

impl<R> std::fmt::Debug for Input<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("half", &self.half)
            .field("lexeme_begin", &self.lexeme_begin)
            .field("forward", &self.forward)
            .field("end", &self.end)
            .field("runes_consumed", &self.runes_consumed)
            .field("rune_sizes", &self.rune_sizes)
            .finish()
    }
}

impl<R: Read> Input<R> {
    /// Creates a reader over `source` with a buffer of `2 * half_size` bytes
    /// and fills the low half.
    pub fn new(source: R, half_size: usize) -> Result<Self, InputError> {
        if half_size == 0 {
            return Err(InputError::InvalidBufferSize);
        }

        let mut input = Self {
            source,
            buffer: vec![EOF; 2 * half_size].into_boxed_slice(),
            half: half_size,
            lexeme_begin: 0,
            forward: 0,
            end: None,
            loaded: None,
            runes_consumed: 0,
            rune_sizes: Vec::default(),
            lexeme_bytes: 0,
            pending: None,
            halt: None,
        };

        input.load(Half::Low);
        Ok(input)
    }

    pub fn with_default_size(source: R) -> Result<Self, InputError> {
        Self::new(source, DEFAULT_HALF_SIZE)
    }

    /// Decodes the next rune and advances past it.
    ///
    /// Returns `Ok(None)` at the end of the input. Both the end of input and
    /// errors are sticky.
    pub fn next(&mut self) -> Result<Option<char>, InputError> {
        match &self.halt {
            Some(Halt::Eof) => return Ok(None),
            Some(Halt::Failed(err)) => return Err(err.clone()),
            None => (),
        }

        if let Some(err) = self.pending.take() {
            return Err(self.fail(err));
        }

        let start = self.forward;
        let position = self.runes_consumed + self.rune_sizes.len();

        let Some(first) = self.advance() else {
            if let Some(err) = self.pending.take() {
                return Err(self.fail(err));
            }
            self.halt = Some(Halt::Eof);
            return Ok(None);
        };

        let class = FIRST[first as usize];
        if class == INVALID {
            return Err(self.fail_decode(start, position));
        }

        let size = class & 0x0F;
        if size == 1 {
            self.rune_sizes.push(1);
            return Ok(Some(char::from(first)));
        }

        let (mut lo, mut hi) = ACCEPT_RANGES[(class >> 4) as usize];
        let mut code = u32::from(first & (0x7F >> size));

        for _ in 1..size {
            let Some(byte) = self.advance() else {
                // A reload failure ends the data early, report it rather
                // than a truncated sequence.
                if let Some(err) = self.pending.take() {
                    return Err(self.fail(err));
                }
                return Err(self.fail_decode(start, position));
            };

            if byte < lo || byte > hi {
                return Err(self.fail_decode(start, position));
            }

            code = (code << 6) | u32::from(byte & 0x3F);
            (lo, hi) = ACCEPT_RANGES[0];
        }

        match char::from_u32(code) {
            Some(rune) => {
                self.rune_sizes.push(size);
                Ok(Some(rune))
            }
            None => Err(self.fail_decode(start, position)),
        }
    }

    /// Returns the next rune without consuming it.
    pub fn peek(&mut self) -> Result<Option<char>, InputError> {
        let rune = self.next()?;
        if rune.is_some() {
            self.retract();
        }
        Ok(rune)
    }

    /// Reads the byte under `forward` and moves past it, refilling a half
    /// before its first byte is read.
    fn advance(&mut self) -> Option<u8> {
        if self.forward == 0 {
            self.reload(Half::Low)?;
        } else if self.forward == self.half {
            self.reload(Half::High)?;
        }

        if self.end == Some(self.forward) {
            return None;
        }

        let byte = self.buffer[self.forward];
        self.forward = (self.forward + 1) % (2 * self.half);
        self.lexeme_bytes += 1;
        Some(byte)
    }

    /// Refills `half` unless it already holds the data following the other
    /// half (we got back here through `retract`).
    ///
    /// Past `N` pending bytes the lexeme reaches into `half`, so the refill
    /// is refused: the data ends here and the overflow is reported.
    fn reload(&mut self, half: Half) -> Option<()> {
        if self.loaded == Some(half) || self.end.is_some() {
            return Some(());
        }

        if self.lexeme_bytes > self.half {
            debug!(
                position = self.runes_consumed,
                bytes = self.lexeme_bytes,
                "lexeme overflows the input buffer"
            );
            self.end = Some(self.forward);
            self.pending = Some(InputError::LexemeTooLong {
                position: self.runes_consumed,
            });
            return None;
        }

        self.load(half);
        Some(())
    }

    fn load(&mut self, half: Half) {
        self.loaded = Some(half);

        let offset = half.offset(self.half);
        let (read, err) = fill(&mut self.source, &mut self.buffer[offset..offset + self.half]);

        if read < self.half {
            self.end = Some(offset + read);
            self.buffer[offset + read] = EOF;
        }

        trace!(?half, read, "reloaded input buffer");

        if let Some(err) = err {
            self.pending = Some(err.into());
        }
    }

    fn fail(&mut self, err: InputError) -> InputError {
        self.halt = Some(Halt::Failed(err.clone()));
        err
    }

    fn fail_decode(&mut self, start: usize, position: usize) -> InputError {
        self.forward = start;
        self.lexeme_bytes = self.rune_sizes.iter().copied().map(usize::from).sum();
        self.fail(InputError::InvalidUtf8 { position })
    }
}

impl<R> Input<R> {
    /// Steps back over the last rune read since the last `lexeme` or `skip`.
    ///
    /// Does nothing when no such rune is left.
    pub fn retract(&mut self) {
        if let Some(size) = self.rune_sizes.pop() {
            let len = 2 * self.half;
            self.forward = (self.forward + len - usize::from(size)) % len;
            self.lexeme_bytes -= usize::from(size);
        }
    }

    /// Surrenders the pending lexeme and returns it with the rune offset it
    /// starts at.
    pub fn lexeme(&mut self) -> (String, usize) {
        let len = 2 * self.half;
        let bytes = (0..self.lexeme_bytes)
            .map(|i| self.buffer[(self.lexeme_begin + i) % len])
            .collect::<Vec<_>>();

        let position = self.skip();
        // The bytes were validated while decoding.
        (String::from_utf8_lossy(&bytes).into_owned(), position)
    }

    /// Drops the pending lexeme and returns the rune offset it started at.
    pub fn skip(&mut self) -> usize {
        let position = self.runes_consumed;
        self.runes_consumed += self.rune_sizes.len();
        self.rune_sizes.clear();
        self.lexeme_bytes = 0;
        self.lexeme_begin = self.forward;
        position
    }

    /// Number of runes surrendered so far.
    pub fn runes_consumed(&self) -> usize {
        self.runes_consumed
    }

    /// Number of runes read since the last `lexeme` or `skip`.
    pub fn pending_runes(&self) -> usize {
        self.rune_sizes.len()
    }
}

/// Reads until `buf` is full or the source is drained.
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> (usize, Option<io::Error>) {
    let mut read = 0;

    while read < buf.len() {
        match source.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => (),
            Err(err) => return (read, Some(err)),
        }
    }

    (read, None)
}
