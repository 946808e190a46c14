//! Binary frame codec for replication envelopes.
//!
//! Uses bincode. The envelope carries a format version so observers built
//! against another layout fail loudly instead of applying garbage.

use crate::error::CodecError;
use crate::replication::Envelope;

/// Version number for the frame format (increment when `Delta` changes).
pub const FRAME_VERSION: u8 = 1;

pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(envelope)?)
}

pub fn decode(frame: &[u8]) -> Result<Envelope, CodecError> {
    let envelope: Envelope = bincode::deserialize(frame)?;
    if envelope.version != FRAME_VERSION {
        return Err(CodecError::VersionMismatch {
            expected: FRAME_VERSION,
            found: envelope.version,
        });
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replication::Delta;
    use storefront_logic::buffs::{BuffId, BuffRecord};
    use storefront_logic::effects::StatKind;

    #[test]
    fn buff_list_survives_encoding() {
        let env = Envelope::new(
            4,
            Delta::Buffs(vec![BuffRecord {
                id: BuffId(2),
                stat: StatKind::DeliveryReward,
                amount: 1.5,
                remaining_days: 3,
                is_active: true,
            }]),
        );
        let frame = encode(&env).unwrap();
        assert_eq!(decode(&frame).unwrap(), env);
    }

    #[test]
    fn version_mismatch_rejected() {
        let mut env = Envelope::new(1, Delta::Day(3));
        env.version = FRAME_VERSION + 1;
        let frame = encode(&env).unwrap();
        assert!(matches!(
            decode(&frame),
            Err(CodecError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn truncated_frame_is_error() {
        let frame = encode(&Envelope::new(1, Delta::Day(3))).unwrap();
        assert!(matches!(
            decode(&frame[..frame.len() - 1]),
            Err(CodecError::Bincode(_))
        ));
    }
}
