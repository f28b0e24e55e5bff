//! Minimal XDR (RFC 4506) writer: big-endian, 4-byte aligned.

#[derive(Debug, Default)]
pub(crate) struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn i64(&mut self, value: i64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// `opaque[n]`
    pub(crate) fn fixed_opaque(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self.pad(data.len())
    }

    /// `opaque<>`: length prefix then padded bytes
    pub(crate) fn var_opaque(&mut self, data: &[u8]) -> &mut Self {
        // Callers only pass signatures and hashes
        self.u32(data.len() as u32);
        self.fixed_opaque(data)
    }

    pub(crate) fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn pad(&mut self, len: usize) -> &mut Self {
        let padding = (4 - len % 4) % 4;
        self.buf.extend(std::iter::repeat(0u8).take(padding));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_are_big_endian() {
        let mut w = XdrWriter::new();
        w.u32(1).i64(-2).u64(3);
        assert_eq!(
            w.into_bytes(),
            vec![0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe, 0, 0, 0, 0, 0, 0, 0, 3]
        );
    }

    #[test]
    fn test_opaque_padding() {
        let mut w = XdrWriter::new();
        w.var_opaque(&[1, 2, 3, 4, 5]);
        assert_eq!(w.into_bytes(), vec![0, 0, 0, 5, 1, 2, 3, 4, 5, 0, 0, 0]);

        let mut w = XdrWriter::new();
        w.fixed_opaque(&[9; 4]);
        assert_eq!(w.into_bytes(), vec![9; 4]);
    }
}
