//! Transmitter identifier extraction
//!
//! The decoder treats identifier extraction as an opaque capability: given a
//! radio payload and its length, return an identifier and its type, or
//! `Unknown`. [`DefaultIdentifierExtractor`] covers the two radio families a
//! reel decodes: reelyActive active RFID (4 or 6 byte payloads) and Bluetooth
//! Low Energy advertising (9 to 39 bytes).

use crate::types::{IdentifierType, TransmitterId};

/// Extract a transmitter identity from a radio payload
pub trait IdentifierExtractor: Send + Sync {
    fn extract(&self, payload: &[u8], payload_length: u8) -> TransmitterId;
}

impl<F> IdentifierExtractor for F
where
    F: Fn(&[u8], u8) -> TransmitterId + Send + Sync,
{
    fn extract(&self, payload: &[u8], payload_length: u8) -> TransmitterId {
        self(payload, payload_length)
    }
}

const BLE_TX_ADD_RANDOM: u8 = 0x40;
const BLE_ADDRESS_START: usize = 2;
const BLE_ADDRESS_LENGTH: usize = 6;
const RA28_MASK: u32 = 0x0FFF_FFFF;

/// Extractor for reelyActive RFID and BLE advertising payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIdentifierExtractor;

impl DefaultIdentifierExtractor {
    fn reelyactive(payload: &[u8]) -> TransmitterId {
        if payload.len() < 4 {
            return TransmitterId::unknown();
        }
        let raw = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        TransmitterId::new(format!("{:07x}", raw & RA28_MASK), IdentifierType::Ra28)
    }

    fn bluetooth_low_energy(payload: &[u8]) -> TransmitterId {
        let end = BLE_ADDRESS_START + BLE_ADDRESS_LENGTH;
        if payload.len() < end {
            return TransmitterId::unknown();
        }

        // Advertiser address is transmitted least significant byte first
        let mut address = payload[BLE_ADDRESS_START..end].to_vec();
        address.reverse();

        let identifier_type = if payload[0] & BLE_TX_ADD_RANDOM != 0 {
            IdentifierType::Rnd48
        } else {
            IdentifierType::Eui48
        };
        TransmitterId::new(hex::encode(address), identifier_type)
    }
}

impl IdentifierExtractor for DefaultIdentifierExtractor {
    fn extract(&self, payload: &[u8], payload_length: u8) -> TransmitterId {
        match payload_length {
            4 | 6 => Self::reelyactive(payload),
            9..=39 => Self::bluetooth_low_energy(payload),
            _ => TransmitterId::unknown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ble_random_address_is_reversed() {
        let payload = hex::decode("421655daba50e1fe0201050c097265656c79416374697665").unwrap();
        let id = DefaultIdentifierExtractor.extract(&payload, payload.len() as u8);
        assert_eq!(id.identifier.as_deref(), Some("fee150bada55"));
        assert_eq!(id.identifier_type, IdentifierType::Rnd48);
    }

    #[test]
    fn ble_public_address() {
        let payload = hex::decode("0010112233445566020106").unwrap();
        let id = DefaultIdentifierExtractor.extract(&payload, payload.len() as u8);
        assert_eq!(id.identifier.as_deref(), Some("665544332211"));
        assert_eq!(id.identifier_type, IdentifierType::Eui48);
    }

    #[test]
    fn reelyactive_keeps_low_28_bits() {
        let id = DefaultIdentifierExtractor.extract(&[0x01, 0x00, 0x00, 0x00], 4);
        assert_eq!(id.identifier.as_deref(), Some("1000000"));
        assert_eq!(id.identifier_type, IdentifierType::Ra28);

        let id = DefaultIdentifierExtractor.extract(&[0xF1, 0x23, 0x45, 0x67, 0x00, 0x00], 6);
        assert_eq!(id.identifier.as_deref(), Some("1234567"));
    }

    #[test]
    fn unsupported_lengths_are_unknown() {
        for length in [1u8, 2, 3, 5, 7, 8, 40] {
            let payload = vec![0u8; length as usize];
            assert!(DefaultIdentifierExtractor.extract(&payload, length).is_unknown());
        }
    }

    #[test]
    fn closures_are_extractors() {
        let fixed = |_: &[u8], _: u8| TransmitterId::new("abc", IdentifierType::Eui64);
        assert_eq!(fixed.extract(&[], 0).identifier.as_deref(), Some("abc"));
    }
}
