//! Gerência da sessão TCP de saída do dispositivo.
//!
//! Conecta ao relay com timeout fixo, classifica falhas de rede para
//! diagnóstico (recusada / inalcançável / timeout, como a tabela de errno do
//! firmware original), dirige o retry limitado de partida e envia um byte de
//! postura por ciclo. Qualquer erro de I/O derruba a sessão de volta para
//! `Disconnected`; o chamador decide quando reconectar.

use crate::error::FatalError;
use sentinel_core::protocol::encode_posture;
use sentinel_core::retry::RetryPolicy;
use sentinel_core::types::PostureCode;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::{info, warn};

/// Fase da sessão com o relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
}

/// Falhas de rede recuperáveis, classificadas para diagnóstico.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("conexão recusada (relay sem servidor ativo ou porta errada)")]
    Refused,

    #[error("host inalcançável (IP errado ou rede isolada)")]
    Unreachable,

    #[error("timeout de conexão (relay não respondeu)")]
    TimedOut,

    #[error("endereço do relay inválido: {0}")]
    BadAddress(String),

    #[error("sem sessão ativa")]
    NotConnected,

    #[error("erro de I/O: {0}")]
    Io(#[from] io::Error),
}

fn classify_io(e: io::Error) -> NetworkError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => NetworkError::Refused,
        io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
            NetworkError::Unreachable
        }
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => NetworkError::TimedOut,
        _ => NetworkError::Io(e),
    }
}

/// Dono da sessão TCP de saída (protocolo A).
pub struct DeviceLinkManager {
    endpoint: String,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
    phase: ConnectionPhase,
    retry_count: u32,
}

impl DeviceLinkManager {
    pub fn new(endpoint: String, connect_timeout: Duration) -> Self {
        Self {
            endpoint,
            connect_timeout,
            stream: None,
            phase: ConnectionPhase::Disconnected,
            retry_count: 0,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Tentativas consumidas desde a última conexão bem-sucedida.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn resolve(&self) -> Result<SocketAddr, NetworkError> {
        self.endpoint
            .to_socket_addrs()
            .map_err(|e| NetworkError::BadAddress(format!("{}: {e}", self.endpoint)))?
            .next()
            .ok_or_else(|| NetworkError::BadAddress(self.endpoint.clone()))
    }

    /// Abre uma sessão com o relay. Qualquer sessão anterior é fechada antes
    /// (teardown idempotente). Não faz retry internamente.
    pub fn connect(&mut self) -> Result<(), NetworkError> {
        self.stream = None; // drop fecha o socket anterior
        self.phase = ConnectionPhase::Connecting;

        let addr = match self.resolve() {
            Ok(addr) => addr,
            Err(e) => {
                self.phase = ConnectionPhase::Disconnected;
                return Err(e);
            }
        };

        match TcpStream::connect_timeout(&addr, self.connect_timeout) {
            Ok(stream) => {
                self.stream = Some(stream);
                self.phase = ConnectionPhase::Connected;
                self.retry_count = 0;
                info!("✅ Conectado ao relay {}", self.endpoint);
                Ok(())
            }
            Err(e) => {
                self.phase = ConnectionPhase::Disconnected;
                self.retry_count += 1;
                Err(classify_io(e))
            }
        }
    }

    /// Dirige `connect()` até sucesso ou exaustão da política. A exaustão é
    /// fatal: o chamador não pode seguir para o loop de amostragem.
    pub fn ensure_startup_connection(
        &mut self,
        policy: &RetryPolicy,
        cancel: &AtomicBool,
    ) -> Result<(), FatalError> {
        for attempt in 1..=policy.max_attempts() {
            match self.connect() {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "❌ Tentativa de conexão {attempt}/{} falhou: {e}",
                        policy.max_attempts()
                    );
                }
            }

            if attempt < policy.max_attempts() && !policy.wait(attempt, cancel) {
                return Err(FatalError::Cancelled);
            }
        }

        Err(FatalError::RetriesExhausted(policy.max_attempts()))
    }

    /// Envia um código de postura como o payload de 1 byte do protocolo A.
    ///
    /// Falha de escrita derruba a sessão para `Disconnected` e é reportada
    /// ao chamador – que não deve encerrar o loop de amostragem por isso.
    pub fn send_posture(&mut self, code: PostureCode) -> Result<(), NetworkError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(NetworkError::NotConnected);
        };

        if let Err(e) = stream.write_all(&encode_posture(code)) {
            self.stream = None;
            self.phase = ConnectionPhase::Disconnected;
            return Err(classify_io(e));
        }

        Ok(())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::sync::atomic::Ordering;

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Porta local recém-liberada: bind efêmero e drop do listener.
    fn dead_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    #[test]
    fn connect_and_send_two_postures() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let reader = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 2];
            stream.read_exact(&mut buf).unwrap();
            buf
        });

        let mut link = DeviceLinkManager::new(addr.to_string(), CONNECT_TIMEOUT);
        link.connect().unwrap();
        assert!(link.is_connected());
        assert_eq!(link.retry_count(), 0);

        link.send_posture(PostureCode::Normal).unwrap();
        link.send_posture(PostureCode::Fall).unwrap();

        assert_eq!(reader.join().unwrap(), [0, 1]);
    }

    #[test]
    fn connect_replaces_previous_session() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = DeviceLinkManager::new(addr.to_string(), CONNECT_TIMEOUT);
        link.connect().unwrap();
        // Teardown idempotente: reconectar sobre uma sessão viva funciona
        link.connect().unwrap();
        assert!(link.is_connected());

        drop(listener);
    }

    #[test]
    fn refused_connection_is_classified() {
        let mut link = DeviceLinkManager::new(dead_endpoint(), CONNECT_TIMEOUT);
        match link.connect() {
            Err(NetworkError::Refused) => {}
            other => panic!("esperado Refused, veio {other:?}"),
        }
        assert_eq!(link.phase(), ConnectionPhase::Disconnected);
    }

    #[test]
    fn send_without_session_fails() {
        let mut link = DeviceLinkManager::new("127.0.0.1:1".into(), CONNECT_TIMEOUT);
        assert!(matches!(
            link.send_posture(PostureCode::Normal),
            Err(NetworkError::NotConnected)
        ));
    }

    #[test]
    fn startup_exhaustion_is_fatal() {
        let mut link = DeviceLinkManager::new(dead_endpoint(), CONNECT_TIMEOUT);
        let policy = RetryPolicy::fixed(Duration::from_millis(5), 3);
        let cancel = AtomicBool::new(false);

        match link.ensure_startup_connection(&policy, &cancel) {
            Err(FatalError::RetriesExhausted(3)) => {}
            other => panic!("esperada exaustão fatal, veio {other:?}"),
        }
        assert_eq!(link.retry_count(), 3);
        assert!(!link.is_connected());
    }

    #[test]
    fn startup_succeeds_with_listener_up() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = DeviceLinkManager::new(addr.to_string(), CONNECT_TIMEOUT);
        let policy = RetryPolicy::fixed(Duration::from_millis(5), 20);
        let cancel = AtomicBool::new(false);

        link.ensure_startup_connection(&policy, &cancel).unwrap();
        assert!(link.is_connected());
    }

    #[test]
    fn startup_cancel_interrupts_wait() {
        let mut link = DeviceLinkManager::new(dead_endpoint(), CONNECT_TIMEOUT);
        let policy = RetryPolicy::fixed(Duration::from_secs(30), 20);
        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::Relaxed);

        assert!(matches!(
            link.ensure_startup_connection(&policy, &cancel),
            Err(FatalError::Cancelled)
        ));
    }

    #[test]
    fn write_failure_transitions_to_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = DeviceLinkManager::new(addr.to_string(), CONNECT_TIMEOUT);
        link.connect().unwrap();

        // Derruba o lado do servidor; o RST chega em algum write seguinte
        let (stream, _) = listener.accept().unwrap();
        drop(stream);
        drop(listener);

        let mut failed = false;
        for _ in 0..50 {
            if link.send_posture(PostureCode::Fall).is_err() {
                failed = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(failed, "escrita deveria falhar após o peer fechar");
        assert_eq!(link.phase(), ConnectionPhase::Disconnected);
        assert!(!link.is_connected());
    }
}
