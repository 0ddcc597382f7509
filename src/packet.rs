/// Packet types understood by the protocol. `Command` and `ResponseAuth`
/// share the wire value 2; which one a 2 means depends on direction, so
/// inbound packets always decode as [PacketType::ResponseAuth].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    // SERVERDATA_EXECCOMMAND
    Command,
    // SERVERDATA_AUTH
    Auth,
    // SERVERDATA_RESPONSE_VALUE
    ResponseValue,
    // SERVERDATA_AUTH_RESPONSE
    ResponseAuth,
}

impl PacketType {
    pub fn value(self) -> i32 {
        match self {
            PacketType::Command => 2,
            PacketType::Auth => 3,
            PacketType::ResponseValue => 0,
            PacketType::ResponseAuth => 2,
        }
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.value().to_le_bytes()
    }
}

impl TryFrom<i32> for PacketType {
    type Error = i32;

    fn try_from(value: i32) -> Result<PacketType, i32> {
        match value {
            3 => Ok(PacketType::Auth),
            2 => Ok(PacketType::ResponseAuth),
            0 => Ok(PacketType::ResponseValue),
            other => Err(other),
        }
    }
}

/// A single TCP rcon packet. The UDP transport does not use these; its
/// framing lives in [crate::codec::udp].
pub struct Packet {
    id: i32,
    packet_type: PacketType,
    body: String,
}

impl Packet {
    /// Bytes a packet occupies beyond its body: id, type and the two
    /// mandatory trailing nulls.
    pub const BASE_PACKET_SIZE: i32 = 10;

    pub fn new(id: i32, packet_type: PacketType, body: impl Into<String>) -> Self {
        Packet {
            id,
            packet_type,
            body: body.into(),
        }
    }

    // Since the only one of these values that can change in length is the body,
    // an easy way to calculate the size of a packet is to find the byte-length
    // of the packet body, then add 10 to it.
    pub fn size(&self) -> i32 {
        self.body.len() as i32 + Self::BASE_PACKET_SIZE
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn body(&self) -> &str {
        self.body.as_ref()
    }

    pub fn into_body(self) -> String {
        self.body
    }

    pub fn pack(&self) -> Vec<u8> {
        // Size, ID, Type, Body, Terminator
        let mut payload = Vec::with_capacity(self.size() as usize + 4);
        payload.extend_from_slice(&self.size().to_le_bytes());
        payload.extend_from_slice(&self.id().to_le_bytes());
        payload.extend_from_slice(&self.packet_type().to_le_bytes());
        payload.extend_from_slice(self.body().as_bytes());
        // null terminate the body (C++ interop 🤢), then null terminate the entire packet
        payload.extend_from_slice(&[0u8, 0u8]);
        payload
    }
}
