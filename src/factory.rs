use crate::adapter::{Tls12RecordAdapter, Tls13RecordAdapter, VersionAdapterImpl};
use crate::error::{RecordError, Result};
use crate::protocol_version::{is_recognized_version, TLS_1_3_VERSION};
use crate::record_layer::RecordLayer;

/// Builds a `RecordLayer` for a negotiated protocol version, picking the
/// TLS 1.2 or TLS 1.3 adapter once and sealing the choice into the
/// resulting layer at connection setup; there is no runtime re-dispatch
/// afterwards.
pub struct RecordLayerFactory;

impl RecordLayerFactory {
    /// `tls_version` must be one of the four recognized wire versions
    /// (`0x0301`..=`0x0304`); anything else, including the historical
    /// `0x0300` (SSL 3.0), is rejected as `UnsupportedVersion`.
    pub fn create(tls_version: u16) -> Result<RecordLayer> {
        if !is_recognized_version(tls_version) {
            return Err(RecordError::UnsupportedVersion);
        }

        let adapter = if tls_version == TLS_1_3_VERSION {
            VersionAdapterImpl::Tls13(Tls13RecordAdapter::new())
        } else {
            VersionAdapterImpl::Tls12(Tls12RecordAdapter::new())
        };

        Ok(RecordLayer::new(adapter, tls_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_version::{
        TLS_1_0_VERSION, TLS_1_1_VERSION, TLS_1_2_VERSION, TLS_1_3_VERSION,
    };

    #[test]
    fn accepts_all_four_recognized_versions() {
        for version in [
            TLS_1_0_VERSION,
            TLS_1_1_VERSION,
            TLS_1_2_VERSION,
            TLS_1_3_VERSION,
        ] {
            assert!(RecordLayerFactory::create(version).is_ok());
        }
    }

    #[test]
    fn rejects_ssl_3_0_and_other_unrecognized_versions() {
        assert!(matches!(
            RecordLayerFactory::create(0x0300),
            Err(RecordError::UnsupportedVersion)
        ));
        assert!(matches!(
            RecordLayerFactory::create(0x0400),
            Err(RecordError::UnsupportedVersion)
        ));
    }
}
