/// TLS protocol version as it appears on the wire: `major << 8 | minor`.
pub const TLS_1_0_VERSION: u16 = 0x0301;
pub const TLS_1_1_VERSION: u16 = 0x0302;
pub const TLS_1_2_VERSION: u16 = 0x0303;
pub const TLS_1_3_VERSION: u16 = 0x0304;

/// TLS 1.3 always writes this on the wire (middlebox compatibility); the
/// real version is established out of band by the handshake.
pub const TLS_1_3_WIRE_VERSION: u16 = TLS_1_2_VERSION;

pub fn is_recognized_version(version: u16) -> bool {
    matches!(
        version,
        TLS_1_0_VERSION | TLS_1_1_VERSION | TLS_1_2_VERSION | TLS_1_3_VERSION
    )
}
