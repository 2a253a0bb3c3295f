//! Compiler-release dependent setting adjustments.

use crate::input::SolcSettings;
use keel_common::SemanticVersion;
use keel_config::EvmVersion;

/// Newest EVM version each release line accepts, checked top down.
const MAX_EVM_VERSIONS: &[(SemanticVersion, EvmVersion)] = &[
    (SemanticVersion::new(0, 8, 29), EvmVersion::Osaka),
    (SemanticVersion::new(0, 8, 27), EvmVersion::Prague),
    (SemanticVersion::new(0, 8, 24), EvmVersion::Cancun),
    (SemanticVersion::new(0, 8, 20), EvmVersion::Shanghai),
    (SemanticVersion::new(0, 8, 18), EvmVersion::Paris),
    (SemanticVersion::new(0, 8, 7), EvmVersion::London),
    (SemanticVersion::new(0, 5, 12), EvmVersion::Berlin),
];

/// First release accepting `settings.metadata.appendCBOR`.
const APPEND_CBOR_SINCE: SemanticVersion = SemanticVersion::new(0, 8, 18);

/// The newest EVM version `version` understands, or `None` for releases
/// older than 0.5.12, whose own default applies.
pub fn max_evm_version(version: &SemanticVersion) -> Option<EvmVersion> {
    MAX_EVM_VERSIONS
        .iter()
        .find(|(since, _)| version >= since)
        .map(|(_, evm)| *evm)
}

/// Returns `settings` adapted to `version`.
///
/// An EVM version newer than the release supports is lowered to its
/// maximum, and `appendCBOR` is dropped for releases that do not know it.
pub fn adjust_settings(settings: &SolcSettings, version: &SemanticVersion) -> SolcSettings {
    let mut adjusted = settings.clone();

    if let (Some(requested), Some(max)) = (adjusted.evm_version, max_evm_version(version)) {
        if requested > max {
            tracing::warn!(
                %version,
                "evm version {requested} is not supported by solc {version}, using {max}"
            );
            adjusted.evm_version = Some(max);
        }
    }

    if *version < APPEND_CBOR_SINCE {
        if let Some(metadata) = adjusted.metadata.as_mut() {
            if metadata.append_cbor == Some(false) {
                tracing::warn!(
                    %version,
                    "append_CBOR = false is not supported by solc {version}, ignoring it"
                );
            }
            metadata.append_cbor = None;
        }
    }

    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MetadataSettings;

    fn v(s: &str) -> SemanticVersion {
        s.parse().unwrap()
    }

    #[test]
    fn table_boundaries() {
        assert_eq!(max_evm_version(&v("0.5.11")), None);
        assert_eq!(max_evm_version(&v("0.5.12")), Some(EvmVersion::Berlin));
        assert_eq!(max_evm_version(&v("0.8.6")), Some(EvmVersion::Berlin));
        assert_eq!(max_evm_version(&v("0.8.7")), Some(EvmVersion::London));
        assert_eq!(max_evm_version(&v("0.8.17")), Some(EvmVersion::London));
        assert_eq!(max_evm_version(&v("0.8.18")), Some(EvmVersion::Paris));
        assert_eq!(max_evm_version(&v("0.8.20")), Some(EvmVersion::Shanghai));
        assert_eq!(max_evm_version(&v("0.8.26")), Some(EvmVersion::Cancun));
        assert_eq!(max_evm_version(&v("0.8.27")), Some(EvmVersion::Prague));
        assert_eq!(max_evm_version(&v("0.8.30")), Some(EvmVersion::Osaka));
    }

    #[test]
    fn lowers_unsupported_evm_version() {
        let settings = SolcSettings {
            evm_version: Some(EvmVersion::Cancun),
            ..SolcSettings::default()
        };
        let adjusted = adjust_settings(&settings, &v("0.8.19"));
        assert_eq!(adjusted.evm_version, Some(EvmVersion::Paris));
    }

    #[test]
    fn keeps_older_evm_version() {
        let settings = SolcSettings {
            evm_version: Some(EvmVersion::Istanbul),
            ..SolcSettings::default()
        };
        let adjusted = adjust_settings(&settings, &v("0.8.24"));
        assert_eq!(adjusted.evm_version, Some(EvmVersion::Istanbul));
    }

    #[test]
    fn leaves_evm_version_for_ancient_releases() {
        let settings = SolcSettings {
            evm_version: Some(EvmVersion::Cancun),
            ..SolcSettings::default()
        };
        let adjusted = adjust_settings(&settings, &v("0.4.26"));
        assert_eq!(adjusted.evm_version, Some(EvmVersion::Cancun));
    }

    #[test]
    fn drops_append_cbor_before_0_8_18() {
        let settings = SolcSettings {
            metadata: Some(MetadataSettings {
                append_cbor: Some(false),
                use_literal_content: Some(true),
                bytecode_hash: None,
            }),
            ..SolcSettings::default()
        };
        let old = adjust_settings(&settings, &v("0.8.17"));
        let metadata = old.metadata.unwrap();
        assert_eq!(metadata.append_cbor, None);
        assert_eq!(metadata.use_literal_content, Some(true));

        let new = adjust_settings(&settings, &v("0.8.18"));
        assert_eq!(new.metadata.unwrap().append_cbor, Some(false));
    }
}
