use std::fmt;

use super::{Header, Name, QueryClass, QueryType, RRData};

/// Parsed DNS packet
#[derive(Debug, Clone)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

/// A parsed chunk of data in the Query section of the packet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Question {
    pub qname: Name,
    pub qtype: QueryType,
    pub qclass: QueryClass,
}

/// A single DNS record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub cls: QueryClass,
    pub ttl: u32,
    pub data: RRData,
}

impl Message {
    /// A referral carries no answers but points at nameservers in its
    /// authority section
    pub fn is_referral(&self) -> bool {
        self.answers.is_empty() && !self.nameservers.is_empty()
    }
}

impl Question {
    pub fn new(qname: Name, qtype: QueryType, qclass: QueryClass) -> Question {
        Question {
            qname,
            qtype,
            qclass,
        }
    }
}

impl ResourceRecord {
    pub fn typ(&self) -> QueryType {
        self.data.typ()
    }

    /// Whether this record answers `question` directly
    pub fn answers(&self, question: &Question) -> bool {
        self.name == question.qname
            && self.typ() == question.qtype
            && self.cls == question.qclass
    }
}

impl fmt::Display for Question {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{} {} {}", self.qname, self.qclass, self.qtype)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}\t{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.cls,
            self.typ(),
            self.data
        )
    }
}
