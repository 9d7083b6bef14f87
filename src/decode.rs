//! Scanned payload decoding (plain codes and weight-embedded retail codes).

/// Payloads longer than this carry an internal code plus an embedded weight.
pub const PLAIN_CODE_MAX_LEN: usize = 13;

/// Result of decoding one scanned payload.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedCode {
    /// Product identity used for comparison and lookups.
    pub identity: String,
    /// Weight in kilograms, present only for weight-encoded payloads.
    pub derived_quantity: Option<f64>,
    /// True when the payload followed the weight-embedded layout.
    pub is_weight_encoded: bool,
}

impl DecodedCode {
    fn plain(payload: &str) -> Self {
        Self {
            identity: payload.to_string(),
            derived_quantity: None,
            is_weight_encoded: false,
        }
    }

    /// Derived quantity formatted the way the quantity field stores it ("0.750").
    pub fn quantity_text(&self) -> Option<String> {
        self.derived_quantity.map(|q| format!("{q:.3}"))
    }
}

/// Decode a raw payload. Never fails: malformed weight payloads fall back to a plain identity.
pub fn decode(payload: &str) -> DecodedCode {
    if payload.chars().count() <= PLAIN_CODE_MAX_LEN {
        return DecodedCode::plain(payload);
    }
    match decode_weighted(payload) {
        Some(decoded) => decoded,
        None => {
            tracing::warn!("weight payload could not be parsed, using it verbatim: {payload}");
            DecodedCode::plain(payload)
        }
    }
}

/// Internal code at offsets 1..=6, grams at offsets 8..=11.
fn decode_weighted(payload: &str) -> Option<DecodedCode> {
    let identity = char_span(payload, 1, 6)?;
    let grams = char_span(payload, 8, 4)?;
    if !grams.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let grams: u32 = grams.parse().ok()?;
    let kg = round3(f64::from(grams) / 1000.0);
    tracing::info!("weight detected: {kg:.3} kg");
    Some(DecodedCode {
        identity,
        derived_quantity: Some(kg),
        is_weight_encoded: true,
    })
}

/// `len` characters starting at character offset `start`.
fn char_span(payload: &str, start: usize, len: usize) -> Option<String> {
    let span: String = payload.chars().skip(start).take(len).collect();
    (span.chars().count() == len).then_some(span)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
