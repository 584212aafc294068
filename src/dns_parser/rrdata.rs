use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::{Error, Name, QueryType};

/// The record data the resolver interprets
///
/// Only address records and NS targets are decoded; everything else keeps
/// its raw RDATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RRData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    /// The nameserver host name, expanded through compression
    NS(Name),
    // Anything that isn't parsed
    Unknown { typ: QueryType, data: Vec<u8> },
}

impl RRData {
    pub fn typ(&self) -> QueryType {
        match *self {
            RRData::A(..) => QueryType::A,
            RRData::AAAA(..) => QueryType::AAAA,
            RRData::NS(..) => QueryType::NS,
            RRData::Unknown { typ, .. } => typ,
        }
    }

    /// Payload length
    ///
    /// For NS records this is the length of the expanded host name text,
    /// not of the bytes it occupied on the wire.
    pub fn len(&self) -> usize {
        match *self {
            RRData::A(..) => 4,
            RRData::AAAA(..) => 16,
            RRData::NS(ref name) => name.as_str().len(),
            RRData::Unknown { ref data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn write_to<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        match *self {
            RRData::A(ip) => writer.write_u32::<BigEndian>(ip.into()),
            RRData::AAAA(ip) => writer.write_all(&ip.octets()),
            RRData::NS(ref name) => name.write_to(writer),
            RRData::Unknown { ref data, .. } => writer.write_all(data),
        }
    }

    /// Decodes the RDATA found at `original[start..end]`
    pub fn parse(
        typ: QueryType,
        original: &[u8],
        start: usize,
        end: usize,
    ) -> Result<RRData, Error> {
        let rdata = original.get(start..end).ok_or(Error::UnexpectedEOF)?;
        match typ {
            QueryType::A => {
                if rdata.len() != 4 {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::A(Ipv4Addr::from(BigEndian::read_u32(rdata))))
            }
            QueryType::AAAA => {
                if rdata.len() != 16 {
                    return Err(Error::WrongRdataLength);
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(rdata);
                Ok(RRData::AAAA(Ipv6Addr::from(octets)))
            }
            QueryType::NS => {
                let (name, consumed) = Name::scan(original, start)?;
                if consumed > rdata.len() {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::NS(name))
            }
            typ => Ok(RRData::Unknown {
                typ,
                data: rdata.to_vec(),
            }),
        }
    }
}

impl fmt::Display for RRData {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RRData::A(ip) => write!(fmt, "{}", ip),
            RRData::AAAA(ip) => write!(fmt, "{}", ip),
            RRData::NS(ref name) => write!(fmt, "{}", name),
            // RFC 3597 generic form
            RRData::Unknown { ref data, .. } => {
                write!(fmt, "\\# {}", data.len())?;
                if !data.is_empty() {
                    fmt.write_str(" ")?;
                    for byte in data {
                        write!(fmt, "{:02x}", byte)?;
                    }
                }
                Ok(())
            }
        }
    }
}
