//! Condições fatais de partida do dispositivo.
//!
//! Cada uma deve encerrar o processo com erro observável em vez de esperar
//! em silêncio; nenhuma pode ocorrer depois que o loop de amostragem começa.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("modelo de inferência não encontrado: {0}")]
    ModelMissing(PathBuf),

    #[error("timeout aguardando conectividade de rede ({0:?})")]
    LinkJoinTimeout(Duration),

    #[error("máximo de tentativas de conexão excedido ({0})")]
    RetriesExhausted(u32),

    #[error("partida cancelada")]
    Cancelled,
}
