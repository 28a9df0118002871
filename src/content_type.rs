/// One-byte tag on every TLS record identifying its sub-protocol.
///
/// A plain `TryFrom<u8>`-shaped enum rather than a parser-combinator-backed
/// wire type, since this crate never parses `ContentType` out of a
/// handshake-message parser DSL -- just off the front of a record header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Heartbeat,
}

impl ContentType {
    pub const fn to_u8(self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Heartbeat => 24,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            20 => ContentType::ChangeCipherSpec,
            21 => ContentType::Alert,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            24 => ContentType::Heartbeat,
            _ => return None,
        })
    }
}

impl From<ContentType> for u8 {
    fn from(value: ContentType) -> Self {
        value.to_u8()
    }
}
