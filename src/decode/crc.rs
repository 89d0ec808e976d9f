//! CRC-16/MODBUS integrity check for the trailing code

const POLYNOMIAL: u16 = 0xA001;
const INITIAL: u16 = 0xFFFF;

/// CRC-16 with the reflected polynomial 0xA001 and initial value 0xFFFF.
///
/// ```rust
/// use brainwave::decode::crc16;
///
/// assert_eq!(crc16(b"123456789"), 0x4B37);
/// ```
pub fn crc16(bytes: &[u8]) -> u16 {
    bytes.iter().fold(INITIAL, |mut crc, &byte| {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLYNOMIAL } else { crc >> 1 };
        }
        crc
    })
}
