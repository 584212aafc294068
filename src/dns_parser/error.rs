use std::io;

use thiserror::Error;

/// Error parsing or building a DNS packet
#[derive(Debug, Error)]
pub enum Error {
    #[error("packet is smaller than header size")]
    HeaderTooShort,
    #[error("packet ends in the middle of a field")]
    UnexpectedEOF,
    #[error("wrong (too short or too long) size of RDATA")]
    WrongRdataLength,
    #[error("label in domain name has unknown label format")]
    UnknownLabelFormat,
    #[error("invalid characters encountered while reading label")]
    LabelIsNotAscii,
    #[error("label contains a dot")]
    DotInLabel,
    #[error("too many compression pointers in domain name")]
    PointerLoop,
    #[error("domain name has an empty label")]
    EmptyLabel,
    #[error("label of {0} bytes is longer than 63 bytes")]
    LabelTooLong(usize),
    #[error("domain name of {0} bytes is longer than 255 bytes")]
    NameTooLong(usize),
    #[error("packet of {0} bytes exceeds the 512 byte limit")]
    PacketTooLarge(usize),
    #[error("section has more than 65535 records")]
    TooManyRecords,
    #[error("couldn't write packet: {0}")]
    Write(#[from] io::Error),
}
