use std::io::{self, Read};

/// One sensor measurement: a reading's origin, value, and timestamp.
///
/// This is the opaque payload SBUF carries — it never inspects these
/// fields, only moves them by value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub sensor_id: u16,
    pub value: f64,
    pub ts: i64,
}

/// Wire size of one frame: `u16` + `f64` + `i64`, host endianness.
pub const FRAME_LEN: usize = 2 + 8 + 8;

impl Record {
    /// Decodes one fixed-layout frame. `buf` must be exactly [`FRAME_LEN`]
    /// bytes.
    pub fn decode(buf: &[u8; FRAME_LEN]) -> Self {
        let sensor_id = u16::from_ne_bytes(buf[0..2].try_into().unwrap());
        let value = f64::from_ne_bytes(buf[2..10].try_into().unwrap());
        let ts = i64::from_ne_bytes(buf[10..18].try_into().unwrap());
        Self {
            sensor_id,
            value,
            ts,
        }
    }

    /// Reads one frame from `reader`. Returns `Ok(None)` on a clean EOF
    /// before any byte of the frame was read; a partial frame followed by
    /// EOF is reported as an `UnexpectedEof` error, not silently dropped.
    pub fn read_one<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut buf = [0u8; FRAME_LEN];
        let mut filled = 0;
        loop {
            match reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed mid-frame",
                    ))
                }
                Ok(n) => {
                    filled += n;
                    if filled == FRAME_LEN {
                        return Ok(Some(Self::decode(&buf)));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
