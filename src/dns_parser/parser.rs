use byteorder::{BigEndian, ByteOrder};

use super::header::HEADER_SIZE;
use super::{
    Error, Header, Message, Name, QueryClass, QueryType, Question, RRData, ResourceRecord,
};

impl Message {
    /// Parse a full DNS message
    ///
    /// Every section holds exactly as many entries as its header count says;
    /// running out of data before that is an error.
    pub fn parse(data: &[u8]) -> Result<Message, Error> {
        let header = Header::parse(data)?;
        let mut offset = HEADER_SIZE;

        let mut questions = Vec::new();
        for _ in 0..header.questions {
            let (qname, consumed) = Name::scan(data, offset)?;
            offset += consumed;
            let fixed = data.get(offset..offset + 4).ok_or(Error::UnexpectedEOF)?;
            questions.push(Question {
                qname,
                qtype: QueryType::from(BigEndian::read_u16(&fixed[..2])),
                qclass: QueryClass::from(BigEndian::read_u16(&fixed[2..4])),
            });
            offset += 4;
        }

        let answers = parse_records(data, &mut offset, header.answers)?;
        let nameservers = parse_records(data, &mut offset, header.nameservers)?;
        let additional = parse_records(data, &mut offset, header.additional)?;

        Ok(Message {
            header,
            questions,
            answers,
            nameservers,
            additional,
        })
    }
}

fn parse_records(
    data: &[u8],
    offset: &mut usize,
    count: u16,
) -> Result<Vec<ResourceRecord>, Error> {
    let mut records = Vec::new();
    for _ in 0..count {
        records.push(parse_record(data, offset)?);
    }
    Ok(records)
}

// Moves offset past the record
fn parse_record(data: &[u8], offset: &mut usize) -> Result<ResourceRecord, Error> {
    let (name, consumed) = Name::scan(data, *offset)?;
    *offset += consumed;

    let fixed = data.get(*offset..*offset + 10).ok_or(Error::UnexpectedEOF)?;
    let typ = QueryType::from(BigEndian::read_u16(&fixed[..2]));
    let cls = QueryClass::from(BigEndian::read_u16(&fixed[2..4]));
    let ttl = BigEndian::read_u32(&fixed[4..8]);
    let rdlen = BigEndian::read_u16(&fixed[8..10]) as usize;
    *offset += 10;

    let end = *offset + rdlen;
    if end > data.len() {
        return Err(Error::UnexpectedEOF);
    }
    let rdata = RRData::parse(typ, data, *offset, end)?;
    *offset = end;

    Ok(ResourceRecord {
        name,
        cls,
        ttl,
        data: rdata,
    })
}
