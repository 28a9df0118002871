use log::{debug, trace, warn};

use crate::adapter::VersionAdapterImpl;
use crate::cipher_state::CipherState;
use crate::content_type::ContentType;
use crate::error::{RecordError, Result};
use crate::padding::{apply_split_record_mitigation, select_protection_strategy, ProtectionStrategy};
use crate::protocol_version::{TLS_1_3_VERSION, TLS_1_3_WIRE_VERSION};
use crate::receive_buffer::ReceiveBuffer;
use crate::record::{Record, MAX_PLAINTEXT_FRAGMENT_LENGTH};
use crate::replay_window::ReplayWindow;
use crate::transport::Transport;

const MIN_FRAGMENT_LENGTH: usize = 64;

/// Whether a direction (read or write) is still sending/receiving plaintext
/// records or has switched to an encrypted cipher state. Each direction
/// tracks this independently, the state surviving across a
/// `ChangeCipherSpec` message exactly as the rest of the connection state
/// does.
enum DirectionState {
    Plaintext,
    Encrypted(CipherState),
}

/// Owns one read direction and one write direction, each independently
/// plaintext-or-encrypted, plus the shared framing/reassembly/
/// replay-detection machinery. A record layer is most naturally one object
/// exposing both `send_record` and `receive_record` rather than two
/// independently constructed halves, since the two directions share a
/// transport and (pre-handshake) a negotiated version.
pub struct RecordLayer {
    adapter: VersionAdapterImpl,
    tls_version: u16,

    write_state: DirectionState,
    read_state: DirectionState,

    receive_buffer: ReceiveBuffer,
    replay_window: ReplayWindow,
    replay_protection_enabled: bool,

    max_fragment_length: usize,
}

impl RecordLayer {
    pub(crate) fn new(adapter: VersionAdapterImpl, tls_version: u16) -> Self {
        Self {
            adapter,
            tls_version,
            write_state: DirectionState::Plaintext,
            read_state: DirectionState::Plaintext,
            receive_buffer: ReceiveBuffer::new(),
            replay_window: ReplayWindow::default(),
            replay_protection_enabled: true,
            max_fragment_length: MAX_PLAINTEXT_FRAGMENT_LENGTH,
        }
    }

    /// Installs `state` as the write direction's cipher state and flips it
    /// to encrypted. A subsequent call replaces the state wholesale (a
    /// cipher-spec change, e.g. after a TLS 1.3 key update).
    pub fn change_write_cipher_spec(&mut self, state: CipherState) {
        debug!("write direction transitioning to encrypted cipher state");
        self.write_state = DirectionState::Encrypted(state);
    }

    /// Installs `state` as the read direction's cipher state, flips it to
    /// encrypted, and resets the replay window -- a new cipher state starts
    /// its own independent sequence-number space, so any prior window
    /// position is meaningless against it.
    pub fn change_read_cipher_spec(&mut self, state: CipherState) {
        debug!("read direction transitioning to encrypted cipher state, resetting replay window");
        self.read_state = DirectionState::Encrypted(state);
        self.replay_window.reset();
    }

    pub fn set_replay_protection(&mut self, enabled: bool) {
        self.replay_protection_enabled = enabled;
    }

    pub fn is_replay_protection_enabled(&self) -> bool {
        self.replay_protection_enabled
    }

    /// Sets the plaintext fragment size records are split into before
    /// sending. Must be in `64..=16384`.
    pub fn set_max_fragment_length(&mut self, len: usize) -> Result<()> {
        if !(MIN_FRAGMENT_LENGTH..=MAX_PLAINTEXT_FRAGMENT_LENGTH).contains(&len) {
            return Err(RecordError::InvalidParameter);
        }
        self.max_fragment_length = len;
        Ok(())
    }

    /// Fragments `data` into records of at most `max_fragment_length`
    /// plaintext bytes, encrypts each (if the write direction has a cipher
    /// state installed) and writes the wire bytes to `transport`. Empty
    /// `data` produces zero records -- sending a heartbeat or an empty
    /// application-data record is the caller's explicit choice, not
    /// something `send_record` does implicitly.
    pub fn send_record(
        &mut self,
        transport: &mut dyn Transport,
        content_type: ContentType,
        data: &[u8],
    ) -> Result<()> {
        let chunks: Vec<&[u8]> = if data.is_empty() {
            Vec::new()
        } else {
            data.chunks(self.max_fragment_length).collect()
        };

        trace!(
            "fragmenting {} bytes into {} record(s) of at most {} bytes",
            data.len(),
            chunks.len(),
            self.max_fragment_length
        );

        for chunk in chunks {
            self.send_one_fragment(transport, content_type, chunk)?;
        }
        Ok(())
    }

    fn send_one_fragment(
        &mut self,
        transport: &mut dyn Transport,
        content_type: ContentType,
        fragment: &[u8],
    ) -> Result<()> {
        let pieces: Vec<Vec<u8>> = match &mut self.write_state {
            DirectionState::Plaintext => vec![fragment.to_vec()],
            DirectionState::Encrypted(state) => {
                let strategy =
                    select_protection_strategy(state.tls_version, state.is_aead_suite());
                match strategy {
                    ProtectionStrategy::SplitRecords => apply_split_record_mitigation(fragment),
                    _ => vec![fragment.to_vec()],
                }
            }
        };

        for piece in pieces {
            self.write_one_protected_record(transport, content_type, &piece)?;
        }
        Ok(())
    }

    fn write_one_protected_record(
        &mut self,
        transport: &mut dyn Transport,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<()> {
        // TLS 1.3 always pins the wire version to 0x0303 for middlebox
        // compatibility, in both the plaintext and encrypted states -- the
        // initial ClientHello flight is just as subject to this as any
        // record sent after the cipher-spec change.
        let wire_version = if self.tls_version == TLS_1_3_VERSION {
            TLS_1_3_WIRE_VERSION
        } else {
            self.tls_version
        };

        let (outer_content_type, fragment, outer_version) = match &mut self.write_state {
            DirectionState::Plaintext => (content_type, plaintext.to_vec(), wire_version),
            DirectionState::Encrypted(state) => {
                let (outer_content_type, ciphertext) =
                    self.adapter.apply_encryption(plaintext, state, content_type)?;
                (outer_content_type, ciphertext, wire_version)
            }
        };

        let record = Record::new(outer_content_type, outer_version, fragment.into());
        let wire_bytes = self.adapter.encode_record(&record);

        let written = transport.send(&wire_bytes)?;
        if written as usize != wire_bytes.len() {
            return Err(RecordError::IncompleteSend {
                written: written as usize,
                requested: wire_bytes.len(),
            });
        }
        Ok(())
    }

    /// Reads and returns the next application-level record: reassembles it
    /// from the transport, checks it against the replay window, and
    /// decrypts it if the read direction has a cipher state installed. The
    /// returned `Record`'s `content_type` is the true (inner, for TLS 1.3)
    /// content type and its `fragment` is plaintext.
    pub fn receive_record(&mut self, transport: &mut dyn Transport) -> Result<Record> {
        let wire_record = self.receive_buffer.fill_until_record(transport)?;

        match &mut self.read_state {
            DirectionState::Plaintext => Ok(wire_record),
            DirectionState::Encrypted(state) => {
                let seq = state.sequence_number();
                if self.replay_protection_enabled && self.replay_window.is_replay(seq) {
                    warn!("rejected replayed record at sequence {}", seq);
                    return Err(RecordError::ReplayDetected);
                }

                let (plaintext, content_type) = self.adapter.apply_decryption(
                    &wire_record.fragment,
                    wire_record.content_type,
                    wire_record.version,
                    state,
                )?;

                if self.replay_protection_enabled {
                    self.replay_window.mark_as_processed(seq);
                }

                Ok(Record::new(content_type, wire_record.version, plaintext.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::adapter::{Tls12RecordAdapter, Tls13RecordAdapter};
    use crate::protocol_version::TLS_1_2_VERSION;
    use crate::transport::InMemoryTransport;

    fn plaintext_layer() -> RecordLayer {
        RecordLayer::new(
            VersionAdapterImpl::Tls12(Tls12RecordAdapter::new()),
            TLS_1_2_VERSION,
        )
    }

    fn plaintext_tls13_layer() -> RecordLayer {
        RecordLayer::new(
            VersionAdapterImpl::Tls13(Tls13RecordAdapter::new()),
            TLS_1_3_VERSION,
        )
    }

    #[test]
    fn tls13_plaintext_records_pin_the_wire_version_before_any_cipher_spec_change() {
        let mut writer = plaintext_tls13_layer();
        let mut transport = InMemoryTransport::new();
        writer
            .send_record(&mut transport, ContentType::Handshake, b"client hello")
            .unwrap();
        // Outer version bytes, offset 1..3 of the header, must be 0x0303
        // (middlebox compatibility) even though the layer's true version is
        // 0x0304 and no cipher-spec change has happened yet.
        assert_eq!(&transport.outbound[1..3], &[0x03, 0x03]);
    }

    #[test]
    fn plaintext_round_trip_over_a_shared_transport() {
        let mut writer = plaintext_layer();
        let mut transport = InMemoryTransport::new();
        writer
            .send_record(&mut transport, ContentType::Handshake, b"client hello")
            .unwrap();

        let mut reader = plaintext_layer();
        let mut read_transport = InMemoryTransport::with_inbound(&transport.outbound);
        let record = reader.receive_record(&mut read_transport).unwrap();
        assert_eq!(record.content_type, ContentType::Handshake);
        assert_eq!(record.fragment.as_ref(), b"client hello");
    }

    #[test]
    fn empty_payload_emits_zero_records() {
        let mut writer = plaintext_layer();
        let mut transport = InMemoryTransport::new();
        writer
            .send_record(&mut transport, ContentType::ApplicationData, b"")
            .unwrap();
        assert!(transport.outbound.is_empty());
    }

    #[test]
    fn fragmentation_splits_oversized_payloads() {
        let mut writer = plaintext_layer();
        writer.set_max_fragment_length(64).unwrap();
        let mut transport = InMemoryTransport::new();
        let data = vec![0x41u8; 150];
        writer
            .send_record(&mut transport, ContentType::ApplicationData, &data)
            .unwrap();

        let mut reader = plaintext_layer();
        let mut read_transport = InMemoryTransport::with_inbound(&transport.outbound);
        let mut reassembled = Vec::new();
        for _ in 0..3 {
            let record = reader.receive_record(&mut read_transport).unwrap();
            assert!(record.fragment.len() <= 64);
            reassembled.extend_from_slice(&record.fragment);
        }
        assert_eq!(reassembled, data);
    }

    #[test]
    fn set_max_fragment_length_rejects_out_of_range_values() {
        let mut layer = plaintext_layer();
        assert!(layer.set_max_fragment_length(0).is_err());
        assert!(layer.set_max_fragment_length(63).is_err());
        assert!(layer.set_max_fragment_length(16385).is_err());
        assert!(layer.set_max_fragment_length(4096).is_ok());
    }

    fn aead_state(tls_version: u16) -> CipherState {
        CipherState::new(
            "TLS_AES_128_GCM_SHA256",
            Bytes::from_static(&[0x10; 16]),
            Bytes::from_static(&[0x20; 12]),
            Bytes::new(),
            tls_version,
        )
    }

    #[test]
    fn encrypted_round_trip_after_cipher_spec_change() {
        let mut writer = plaintext_layer();
        writer.change_write_cipher_spec(aead_state(TLS_1_2_VERSION));

        let mut transport = InMemoryTransport::new();
        writer
            .send_record(&mut transport, ContentType::ApplicationData, b"secret payload")
            .unwrap();

        let mut reader = plaintext_layer();
        reader.change_read_cipher_spec(aead_state(TLS_1_2_VERSION));
        let mut read_transport = InMemoryTransport::with_inbound(&transport.outbound);
        let record = reader.receive_record(&mut read_transport).unwrap();
        assert_eq!(record.fragment.as_ref(), b"secret payload");
    }

    #[test]
    fn replayed_record_is_rejected_on_second_delivery() {
        let mut writer = plaintext_layer();
        writer.change_write_cipher_spec(aead_state(TLS_1_2_VERSION));
        let mut transport = InMemoryTransport::new();
        writer
            .send_record(&mut transport, ContentType::ApplicationData, b"one record")
            .unwrap();

        let mut reader = plaintext_layer();
        reader.change_read_cipher_spec(aead_state(TLS_1_2_VERSION));

        let mut first_delivery = InMemoryTransport::with_inbound(&transport.outbound);
        reader.receive_record(&mut first_delivery).unwrap();

        let mut replay_delivery = InMemoryTransport::with_inbound(&transport.outbound);
        // Force the read state's sequence counter back so the replay check
        // actually fires against the same wire bytes.
        if let DirectionState::Encrypted(state) = &mut reader.read_state {
            state.set_sequence_number_for_test(0);
        }
        let err = reader.receive_record(&mut replay_delivery).unwrap_err();
        assert!(matches!(err, RecordError::ReplayDetected));
    }

    #[test]
    fn disabling_replay_protection_allows_a_repeated_sequence_number() {
        let mut writer = plaintext_layer();
        writer.change_write_cipher_spec(aead_state(TLS_1_2_VERSION));
        let mut transport = InMemoryTransport::new();
        writer
            .send_record(&mut transport, ContentType::ApplicationData, b"one record")
            .unwrap();

        let mut reader = plaintext_layer();
        reader.change_read_cipher_spec(aead_state(TLS_1_2_VERSION));
        reader.set_replay_protection(false);
        assert!(!reader.is_replay_protection_enabled());

        let mut first_delivery = InMemoryTransport::with_inbound(&transport.outbound);
        reader.receive_record(&mut first_delivery).unwrap();

        if let DirectionState::Encrypted(state) = &mut reader.read_state {
            state.set_sequence_number_for_test(0);
        }
        let mut replay_delivery = InMemoryTransport::with_inbound(&transport.outbound);
        assert!(reader.receive_record(&mut replay_delivery).is_ok());
    }
}
