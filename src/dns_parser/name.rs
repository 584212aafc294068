use std::fmt;
use std::hash;
use std::io;
use std::str::{from_utf8, FromStr};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::Error;

/// Longest label a length octet can describe
pub const MAX_LABEL_LEN: usize = 63;
/// Longest encoded name allowed by RFC 1035
pub const MAX_NAME_LEN: usize = 255;
/// Compression pointers followed before a name is rejected as looping
pub const MAX_POINTER_HOPS: usize = 64;

const POINTER_TAG: u8 = 0b1100_0000;

/// A domain name in its dotted text form, without the trailing dot
///
/// Names read from a packet have all compression pointers expanded.
/// Comparison and hashing ignore ASCII case.
#[derive(Debug, Clone)]
pub struct Name(String);

impl Name {
    /// The root name, encoded as a single zero octet
    pub fn root() -> Name {
        Name(String::new())
    }

    /// Reads a possibly compressed name starting at `start` in `original`
    ///
    /// `original` must be the whole message since pointers are offsets from
    /// its first byte. Returns the name and the number of bytes it occupies
    /// at `start`; once a pointer has been followed nothing after it counts.
    pub fn scan(original: &[u8], start: usize) -> Result<(Name, usize), Error> {
        let mut name = String::new();
        let mut pos = start;
        let mut consumed = None;
        let mut hops = 0;
        loop {
            let byte = *original.get(pos).ok_or(Error::UnexpectedEOF)?;
            match byte & POINTER_TAG {
                0 if byte == 0 => {
                    let consumed = consumed.unwrap_or(pos + 1 - start);
                    return Ok((Name(name), consumed));
                }
                0 => {
                    let end = pos + 1 + byte as usize;
                    if end > original.len() {
                        return Err(Error::UnexpectedEOF);
                    }
                    let label = from_utf8(&original[pos + 1..end])
                        .ok()
                        .filter(|label| label.is_ascii())
                        .ok_or(Error::LabelIsNotAscii)?;
                    // would read back as two labels
                    if label.contains('.') {
                        return Err(Error::DotInLabel);
                    }
                    if !name.is_empty() {
                        name.push('.');
                    }
                    name.push_str(label);
                    if name.len() + 2 > MAX_NAME_LEN {
                        return Err(Error::NameTooLong(name.len() + 2));
                    }
                    pos = end;
                }
                POINTER_TAG => {
                    if original.len() < pos + 2 {
                        return Err(Error::UnexpectedEOF);
                    }
                    let off = (BigEndian::read_u16(&original[pos..pos + 2])
                        & !0b1100_0000_0000_0000) as usize;
                    if consumed.is_none() {
                        consumed = Some(pos + 2 - start);
                    }
                    hops += 1;
                    if hops > MAX_POINTER_HOPS {
                        return Err(Error::PointerLoop);
                    }
                    if off >= original.len() {
                        return Err(Error::UnexpectedEOF);
                    }
                    pos = off;
                }
                _ => return Err(Error::UnknownLabelFormat),
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|label| !label.is_empty())
    }

    /// Number of bytes the uncompressed wire form takes
    pub fn wire_len(&self) -> usize {
        self.labels().map(|label| label.len() + 1).sum::<usize>() + 1
    }

    /// Writes the name as uncompressed length-prefixed labels
    pub fn write_to<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        for label in self.labels() {
            writer.write_u8(label.len() as u8)?;
            writer.write_all(label.as_bytes())?;
        }
        writer.write_u8(0)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(name: &str) -> Result<Name, Error> {
        let name = name.strip_suffix('.').unwrap_or(name);
        if name.is_empty() {
            return Ok(Name::root());
        }
        for label in name.split('.') {
            if label.is_empty() {
                return Err(Error::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong(label.len()));
            }
            if !label.is_ascii() {
                return Err(Error::LabelIsNotAscii);
            }
        }
        let name = Name(name.to_owned());
        if name.wire_len() > MAX_NAME_LEN {
            return Err(Error::NameTooLong(name.wire_len()));
        }
        Ok(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

impl hash::Hash for Name {
    fn hash<H>(&self, state: &mut H)
    where
        H: hash::Hasher,
    {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0);
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Name) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Name {}
