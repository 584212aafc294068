use byteorder::{BigEndian, ByteOrder};

use super::{Error, Opcode, ResponseCode};

/// Size of the fixed DNS header in bytes
pub const HEADER_SIZE: usize = 12;

mod flag {
    pub const QUERY: u16 = 0b1000_0000_0000_0000;
    pub const OPCODE_MASK: u16 = 0b0111_1000_0000_0000;
    pub const AUTHORITATIVE: u16 = 0b0000_0100_0000_0000;
    pub const TRUNCATED: u16 = 0b0000_0010_0000_0000;
    pub const RECURSION_DESIRED: u16 = 0b0000_0001_0000_0000;
    pub const RECURSION_AVAILABLE: u16 = 0b0000_0000_1000_0000;
    pub const RESERVED_MASK: u16 = 0b0000_0000_0111_0000;
    pub const RESPONSE_CODE_MASK: u16 = 0b0000_0000_0000_1111;
}

/// Represents parsed header of the packet
///
/// ```text
///                                   1  1  1  1  1  1
///     0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
///   +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///   |                      ID                       |
///   +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///   |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
///   +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///   |                    QDCOUNT                    |
///   |                    ANCOUNT                    |
///   |                    NSCOUNT                    |
///   |                    ARCOUNT                    |
///   +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    /// `true` when QR is clear, i.e. the packet is a query
    pub query: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// The Z field. Kept as received, never validated.
    pub reserved: u8,
    pub response_code: ResponseCode,
    pub questions: u16,
    pub answers: u16,
    pub nameservers: u16,
    pub additional: u16,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Header, Error> {
        if data.len() < HEADER_SIZE {
            return Err(Error::HeaderTooShort);
        }
        let flags = BigEndian::read_u16(&data[2..4]);
        Ok(Header {
            id: BigEndian::read_u16(&data[..2]),
            query: flags & flag::QUERY == 0,
            opcode: Opcode::from(((flags & flag::OPCODE_MASK) >> 11) as u8),
            authoritative: flags & flag::AUTHORITATIVE != 0,
            truncated: flags & flag::TRUNCATED != 0,
            recursion_desired: flags & flag::RECURSION_DESIRED != 0,
            recursion_available: flags & flag::RECURSION_AVAILABLE != 0,
            reserved: ((flags & flag::RESERVED_MASK) >> 4) as u8,
            response_code: ResponseCode::from((flags & flag::RESPONSE_CODE_MASK) as u8),
            questions: BigEndian::read_u16(&data[4..6]),
            answers: BigEndian::read_u16(&data[6..8]),
            nameservers: BigEndian::read_u16(&data[8..10]),
            additional: BigEndian::read_u16(&data[10..12]),
        })
    }

    /// Write a header to a buffer slice
    ///
    /// The Z field is always written as zero.
    ///
    /// # Panics
    ///
    /// When buffer size is not exactly 12 bytes
    pub fn write(&self, data: &mut [u8]) {
        assert_eq!(data.len(), HEADER_SIZE);

        let mut flags = 0u16;
        if !self.query {
            flags |= flag::QUERY;
        }
        flags |= (u16::from(u8::from(self.opcode)) << 11) & flag::OPCODE_MASK;
        if self.authoritative {
            flags |= flag::AUTHORITATIVE;
        }
        if self.truncated {
            flags |= flag::TRUNCATED;
        }
        if self.recursion_desired {
            flags |= flag::RECURSION_DESIRED;
        }
        if self.recursion_available {
            flags |= flag::RECURSION_AVAILABLE;
        }
        flags |= u16::from(u8::from(self.response_code)) & flag::RESPONSE_CODE_MASK;

        BigEndian::write_u16(&mut data[..2], self.id);
        BigEndian::write_u16(&mut data[2..4], flags);
        BigEndian::write_u16(&mut data[4..6], self.questions);
        BigEndian::write_u16(&mut data[6..8], self.answers);
        BigEndian::write_u16(&mut data[8..10], self.nameservers);
        BigEndian::write_u16(&mut data[10..12], self.additional);
    }
}
