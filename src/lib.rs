//! TLS record layer: wire framing, reassembly, MAC-then-Encrypt and AEAD
//! record protection, anti-replay, and padding-oracle/BEAST countermeasures.
//!
//! Handshakes, key schedules and certificate validation live outside this
//! crate -- callers construct a [`RecordLayer`] via [`RecordLayerFactory`]
//! once the negotiated version is known, install [`CipherState`]s as the
//! handshake completes each direction's keys, and drive `send_record` /
//! `receive_record` against their own [`Transport`] implementation.

mod adapter;
mod cipher_state;
mod content_type;
mod error;
mod factory;
mod nonce;
mod padding;
mod primitives;
mod protocol_version;
mod receive_buffer;
mod record;
mod record_layer;
mod replay_window;
mod transport;

pub use cipher_state::CipherState;
pub use content_type::ContentType;
pub use error::{RecordError, Result};
pub use factory::RecordLayerFactory;
pub use padding::ProtectionStrategy;
pub use protocol_version::{
    is_recognized_version, TLS_1_0_VERSION, TLS_1_1_VERSION, TLS_1_2_VERSION, TLS_1_3_VERSION,
    TLS_1_3_WIRE_VERSION,
};
pub use record::{Record, MAX_CIPHERTEXT_FRAGMENT_LENGTH, MAX_PLAINTEXT_FRAGMENT_LENGTH};
pub use record_layer::RecordLayer;
pub use replay_window::{ReplayWindow, DEFAULT_WINDOW_SIZE};
pub use transport::{InMemoryTransport, Transport};
