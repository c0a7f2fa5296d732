//! Protocolos de fio do sistema.
//!
//! **Protocolo A** (dispositivo → relay): stream sem framing, 1 byte por
//! amostra (`0` = normal, `1` = queda), sem ack nem retransmissão.
//!
//! **Protocolo B** (relay → estação): stream de texto UTF-8 sem framing.
//! Registros de alarme são substrings contendo uma de duas frases
//! marcadoras, opcionalmente prefixadas por `ALARM:` / `ALARM CLEARED:`.
//! Vários registros podem chegar concatenados em um único read.

use crate::types::{AlarmKind, PostureCode};

/// Frase marcadora de alarme de queda (fixada pelo firmware do relay).
pub const FALL_MARKER: &str = "Fall detected";

/// Frase marcadora de retorno ao normal.
pub const CLEARED_MARKER: &str = "Posture returned to normal";

/// Prefixo de registro de queda.
pub const ALARM_PREFIX: &str = "ALARM:";

/// Prefixo de registro de normalização.
pub const CLEARED_PREFIX: &str = "ALARM CLEARED:";

/// Erros de decodificação dos protocolos.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("byte de postura inválido: 0x{0:02X} (esperado 0 ou 1)")]
    InvalidPostureByte(u8),
}

// ──────────────────────────────────────────────
// Protocolo A – byte de postura
// ──────────────────────────────────────────────

/// Codifica um [`PostureCode`] no payload de 1 byte do protocolo A.
pub fn encode_posture(code: PostureCode) -> [u8; 1] {
    [code.as_byte()]
}

/// Decodifica um byte do protocolo A. Qualquer valor fora de {0, 1} é
/// rejeitado.
pub fn decode_posture(byte: u8) -> Result<PostureCode, ProtocolError> {
    match byte {
        0 => Ok(PostureCode::Normal),
        1 => Ok(PostureCode::Fall),
        other => Err(ProtocolError::InvalidPostureByte(other)),
    }
}

// ──────────────────────────────────────────────
// Protocolo B – reframing textual de alarmes
// ──────────────────────────────────────────────

/// Um registro reconstruído de um chunk do stream de alarmes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmRecord {
    pub kind: AlarmKind,
    pub text: String,
}

/// Reconstrói registros discretos de um chunk de texto do protocolo B.
///
/// Esquema legado de framing por substring, aplicado por chunk e sem buffer
/// entre reads:
/// 1. quebra o chunk em `ALARM:`;
/// 2. quebra cada pedaço em `ALARM CLEARED:`;
/// 3. cada segmento residual não-vazio vira um registro: contendo
///    [`FALL_MARKER`] → queda; contendo [`CLEARED_MARKER`] → normalização;
///    nenhum dos dois → fragmento descartado em silêncio.
///
/// Limitação conhecida, mantida por compatibilidade: uma frase marcadora
/// dividida entre dois reads nunca é reconstruída – os fragmentos são
/// descartados ou mal classificados. Framing com length-prefix e buffer de
/// remontagem por stream é o redesign natural.
pub fn split_alarms(chunk: &str) -> Vec<AlarmRecord> {
    let mut records = Vec::new();

    for part in chunk.split(ALARM_PREFIX) {
        for piece in part.split(CLEARED_PREFIX) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            if piece.contains(FALL_MARKER) {
                records.push(AlarmRecord {
                    kind: AlarmKind::Fall,
                    text: piece.to_string(),
                });
            } else if piece.contains(CLEARED_MARKER) {
                records.push(AlarmRecord {
                    kind: AlarmKind::Cleared,
                    text: piece.to_string(),
                });
            }
            // Fragmento sem marcador: descartado (ProtocolParseError)
        }
    }

    records
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
