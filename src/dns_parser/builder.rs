use std::convert::TryFrom;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use super::header::HEADER_SIZE;
use super::{Error, Header, Message, Opcode, Question, ResourceRecord, ResponseCode};

/// Largest packet allowed on the wire without EDNS0
pub const MAX_PACKET_SIZE: usize = 512;

/// Settings for an outgoing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub id: u16,
    pub opcode: Opcode,
    pub recursion_desired: bool,
}

impl Default for QueryOptions {
    fn default() -> QueryOptions {
        QueryOptions {
            id: 1,
            opcode: Opcode::StandardQuery,
            recursion_desired: false,
        }
    }
}

impl Message {
    /// Creates a new query asking `questions`
    ///
    /// The answer, authority and additional sections are empty.
    pub fn query(options: QueryOptions, questions: Vec<Question>) -> Message {
        Message {
            header: Header {
                id: options.id,
                query: true,
                opcode: options.opcode,
                authoritative: false,
                truncated: false,
                recursion_desired: options.recursion_desired,
                recursion_available: false,
                reserved: 0,
                response_code: ResponseCode::NoError,
                questions: 0,
                answers: 0,
                nameservers: 0,
                additional: 0,
            },
            questions,
            answers: Vec::new(),
            nameservers: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Returns the packet bytes
    ///
    /// The section counts are taken from the record lists; the ones in
    /// `self.header` are ignored. Names are written without compression.
    /// Packets over 512 bytes are refused.
    pub fn write(&self) -> Result<Vec<u8>, Error> {
        let header = Header {
            questions: count(self.questions.len())?,
            answers: count(self.answers.len())?,
            nameservers: count(self.nameservers.len())?,
            additional: count(self.additional.len())?,
            ..self.header
        };

        let mut buf = Vec::with_capacity(MAX_PACKET_SIZE);
        buf.extend_from_slice(&[0u8; HEADER_SIZE]);
        header.write(&mut buf[..HEADER_SIZE]);

        for question in &self.questions {
            question.qname.write_to(&mut buf)?;
            buf.write_u16::<BigEndian>(question.qtype as u16)?;
            buf.write_u16::<BigEndian>(question.qclass as u16)?;
        }
        for record in self
            .answers
            .iter()
            .chain(&self.nameservers)
            .chain(&self.additional)
        {
            write_rr(&mut buf, record)?;
        }

        if buf.len() > MAX_PACKET_SIZE {
            return Err(Error::PacketTooLarge(buf.len()));
        }
        Ok(buf)
    }
}

fn count(len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::TooManyRecords)
}

fn write_rr(buf: &mut Vec<u8>, record: &ResourceRecord) -> Result<(), Error> {
    record.name.write_to(buf)?;
    buf.write_u16::<BigEndian>(record.typ() as u16)?;
    buf.write_u16::<BigEndian>(record.cls as u16)?;
    buf.write_u32::<BigEndian>(record.ttl)?;

    let size_offset = buf.len();
    buf.write_u16::<BigEndian>(0)?;

    let data_offset = buf.len();
    record.data.write_to(buf)?;
    let data_size = buf.len() - data_offset;

    BigEndian::write_u16(
        &mut buf[size_offset..size_offset + 2],
        u16::try_from(data_size).map_err(|_| Error::WrongRdataLength)?,
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::dns_parser::{Name, QueryClass as QC, QueryType as QT, RRData};

    fn question(name: &str, qtype: QT) -> Question {
        Question::new(name.parse().unwrap(), qtype, QC::IN)
    }

    #[test]
    fn build_query() {
        let options = QueryOptions {
            id: 1573,
            recursion_desired: true,
            ..QueryOptions::default()
        };
        let packet = Message::query(options, vec![question("example.com", QT::A)]);
        let result = b"\x06%\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
                      \x07example\x03com\x00\x00\x01\x00\x01";
        assert_eq!(&packet.write().unwrap()[..], &result[..]);
    }

    #[test]
    fn build_mx_query() {
        let options = QueryOptions {
            id: 23513,
            recursion_desired: true,
            ..QueryOptions::default()
        };
        let packet = Message::query(options, vec![question("_xmpp-server._tcp.gmail.com", QT::MX)]);
        let result = b"[\xd9\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
            \x0c_xmpp-server\x04_tcp\x05gmail\x03com\x00\x00\x0f\x00\x01";
        assert_eq!(&packet.write().unwrap()[..], &result[..]);
    }

    #[test]
    fn query_header_round_trip() {
        let options = QueryOptions {
            id: 0xbeef,
            opcode: Opcode::InverseQuery,
            recursion_desired: true,
        };
        let bytes = Message::query(options, vec![question("www.example.com", QT::NS)])
            .write()
            .unwrap();
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.id, 0xbeef);
        assert_eq!(header.opcode, Opcode::InverseQuery);
        assert!(header.recursion_desired);
        assert!(header.query);
        assert_eq!(header.questions, 1);
        assert_eq!(header.answers, 0);
        assert_eq!(header.nameservers, 0);
        assert_eq!(header.additional, 0);
    }

    #[test]
    fn counts_follow_record_lists() {
        let mut packet = Message::query(QueryOptions::default(), vec![]);
        packet.header.query = false;
        packet.header.answers = 7;
        packet.nameservers.push(ResourceRecord {
            name: "example.com".parse().unwrap(),
            cls: QC::IN,
            ttl: 172800,
            data: RRData::NS("ns1.example.com".parse().unwrap()),
        });
        packet.additional.push(ResourceRecord {
            name: "ns1.example.com".parse().unwrap(),
            cls: QC::IN,
            ttl: 172800,
            data: RRData::A(Ipv4Addr::new(192, 0, 2, 53)),
        });

        let parsed = Message::parse(&packet.write().unwrap()).unwrap();
        assert_eq!(parsed.header.questions, 0);
        assert_eq!(parsed.header.answers, 0);
        assert_eq!(parsed.header.nameservers, 1);
        assert_eq!(parsed.header.additional, 1);
        assert_eq!(parsed.nameservers, packet.nameservers);
        assert_eq!(parsed.additional, packet.additional);
        assert!(parsed.is_referral());
    }

    #[test]
    fn oversized_packet() {
        let mut packet = Message::query(QueryOptions::default(), vec![]);
        for _ in 0..40 {
            packet.answers.push(ResourceRecord {
                name: Name::root(),
                cls: QC::IN,
                ttl: 0,
                data: RRData::A(Ipv4Addr::LOCALHOST),
            });
        }
        match packet.write() {
            Err(Error::PacketTooLarge(len)) => assert_eq!(len, HEADER_SIZE + 40 * 15),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
