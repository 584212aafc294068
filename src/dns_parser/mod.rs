//! DNS wire format: header, names with compression, records and messages

mod builder;
mod enums;
mod error;
mod header;
mod name;
mod parser;
mod rrdata;
mod structs;

pub use self::builder::{QueryOptions, MAX_PACKET_SIZE};
pub use self::enums::{Opcode, QueryClass, QueryType, ResponseCode};
pub use self::error::Error;
pub use self::header::{Header, HEADER_SIZE};
pub use self::name::Name;
pub use self::rrdata::RRData;
pub use self::structs::{Message, Question, ResourceRecord};
