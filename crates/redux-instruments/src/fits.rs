//! Minimal FITS primary-HDU writer for single-precision images.
//!
//! Only what the layout tools need: fixed-format header cards, the END card,
//! 2880-byte block padding and big-endian `f32` data.

use bytemuck::pod_collect_to_vec;

/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Padding byte used for header blocks (ASCII space).
const HEADER_PAD_BYTE: u8 = 0x20;

/// Returns the total byte length (in whole blocks) required to hold `num_bytes`.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    num_bytes.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// A header value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Logical(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// One header card: keyword, value and optional comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Value,
    pub comment: Option<String>,
}

impl Card {
    pub fn new(keyword: &str, value: Value) -> Self {
        Card {
            keyword: keyword.to_string(),
            value,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// Right-justify `src` within `dest`, padding the left with spaces.
fn right_justify(src: &[u8], dest: &mut [u8]) {
    let len = src.len().min(dest.len());
    let start = dest.len() - len;
    dest[start..].copy_from_slice(&src[..len]);
}

fn format_value(value: &Value, field: &mut [u8]) -> usize {
    match value {
        Value::Logical(b) => {
            field[19] = if *b { b'T' } else { b'F' };
            20
        }
        Value::Integer(n) => {
            right_justify(n.to_string().as_bytes(), &mut field[..20]);
            20
        }
        Value::Float(f) => {
            right_justify(format!("{f:.12E}").as_bytes(), &mut field[..20]);
            20
        }
        Value::String(s) => {
            let quoted = s.replace('\'', "''");
            let text = format!("'{quoted:<8}'");
            let len = text.len().min(field.len());
            field[..len].copy_from_slice(&text.as_bytes()[..len]);
            len.max(20)
        }
    }
}

/// Serialize a [`Card`] into an 80-byte fixed-format card image.
pub fn format_card(card: &Card) -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];

    let kw = card.keyword.as_bytes();
    let kw_len = kw.len().min(8);
    buf[..kw_len].copy_from_slice(&kw[..kw_len]);
    buf[8] = b'=';

    let content_end = 10 + format_value(&card.value, &mut buf[10..]);

    if let Some(comment) = &card.comment {
        let start = content_end + 1;
        if start + 3 < CARD_SIZE {
            buf[start] = b'/';
            let bytes = comment.as_bytes();
            let len = bytes.len().min(CARD_SIZE - start - 2);
            buf[start + 2..start + 2 + len].copy_from_slice(&bytes[..len]);
        }
    }

    buf
}

/// Serialize cards into complete header blocks, appending END and padding.
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(padded_byte_len((cards.len() + 1) * CARD_SIZE));
    for card in cards {
        buf.extend_from_slice(&format_card(card));
    }
    let mut end = [b' '; CARD_SIZE];
    end[..3].copy_from_slice(b"END");
    buf.extend_from_slice(&end);
    buf.resize(padded_byte_len(buf.len()), HEADER_PAD_BYTE);
    buf
}

/// Serialize `f32` pixels into big-endian, block-padded FITS data.
pub fn serialize_image_f32(pixels: &[f32]) -> Vec<u8> {
    let mut buf: Vec<u8> = pod_collect_to_vec(pixels);
    for chunk in buf.chunks_exact_mut(4) {
        let val = f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&val.to_be_bytes());
    }
    buf.resize(padded_byte_len(buf.len()), 0);
    buf
}

/// Build a complete primary HDU holding a 2-D `f32` image.
///
/// `pixels` are row-major with `naxis1` columns; `extra` cards follow the
/// mandatory SIMPLE/BITPIX/NAXIS cards.
pub fn build_image_hdu_f32(
    naxis1: usize,
    naxis2: usize,
    pixels: &[f32],
    extra: &[Card],
) -> Vec<u8> {
    let mut cards = vec![
        Card::new("SIMPLE", Value::Logical(true)).with_comment("conforms to FITS standard"),
        Card::new("BITPIX", Value::Integer(-32)).with_comment("bits per data value"),
        Card::new("NAXIS", Value::Integer(2)).with_comment("number of axes"),
        Card::new("NAXIS1", Value::Integer(naxis1 as i64)),
        Card::new("NAXIS2", Value::Integer(naxis2 as i64)),
    ];
    cards.extend_from_slice(extra);

    let header = serialize_header(&cards);
    let data = serialize_image_f32(pixels);
    let mut hdu = Vec::with_capacity(header.len() + data.len());
    hdu.extend_from_slice(&header);
    hdu.extend_from_slice(&data);
    hdu
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card_text(card: &Card) -> String {
        String::from_utf8(format_card(card).to_vec()).unwrap()
    }

    #[test]
    fn padded_len_rounds_up_to_blocks() {
        assert_eq!(padded_byte_len(0), 0);
        assert_eq!(padded_byte_len(1), BLOCK_SIZE);
        assert_eq!(padded_byte_len(BLOCK_SIZE), BLOCK_SIZE);
        assert_eq!(padded_byte_len(BLOCK_SIZE + 1), 2 * BLOCK_SIZE);
    }

    #[test]
    fn logical_card_in_column_thirty() {
        let text = card_text(&Card::new("SIMPLE", Value::Logical(true)));
        assert!(text.starts_with("SIMPLE  = "));
        assert_eq!(&text[29..30], "T");
    }

    #[test]
    fn integer_card_right_justified() {
        let text = card_text(&Card::new("NAXIS1", Value::Integer(1466)));
        assert_eq!(&text[..30], "NAXIS1  =                 1466");
    }

    #[test]
    fn float_card_parses_back() {
        let text = card_text(&Card::new("CRVAL1", Value::Float(14.79625)));
        let field = text[10..30].trim();
        let parsed: f64 = field.parse().unwrap();
        assert!((parsed - 14.79625).abs() < 1e-10);
    }

    #[test]
    fn string_card_quoted_and_padded() {
        let text = card_text(&Card::new("CTYPE1", Value::String("RA---TAN".into())));
        assert_eq!(&text[10..20], "'RA---TAN'");
        let text = card_text(&Card::new("OBJECT", Value::String("M1".into())));
        assert_eq!(&text[10..20], "'M1      '");
    }

    #[test]
    fn comment_follows_value() {
        let text = card_text(&Card::new("NAXIS", Value::Integer(2)).with_comment("number of axes"));
        assert_eq!(&text[30..48], " / number of axes ");
    }

    #[test]
    fn header_ends_with_end_card_and_pads() {
        let buf = serialize_header(&[Card::new("SIMPLE", Value::Logical(true))]);
        assert_eq!(buf.len(), BLOCK_SIZE);
        assert_eq!(&buf[CARD_SIZE..CARD_SIZE + 3], b"END");
        assert!(buf[2 * CARD_SIZE..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn image_data_is_big_endian() {
        let buf = serialize_image_f32(&[1.0, f32::NAN]);
        assert_eq!(buf.len(), BLOCK_SIZE);
        assert_eq!(&buf[..4], &1.0f32.to_be_bytes());
        assert!(f32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]).is_nan());
        assert!(buf[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn image_hdu_layout() {
        let hdu = build_image_hdu_f32(2, 3, &[0.0; 6], &[]);
        assert_eq!(hdu.len(), 2 * BLOCK_SIZE);
        let header = String::from_utf8(hdu[..BLOCK_SIZE].to_vec()).unwrap();
        assert!(header.contains("BITPIX  =                  -32"));
        assert!(header.contains("NAXIS2  =                    3"));
    }
}
