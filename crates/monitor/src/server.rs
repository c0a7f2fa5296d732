//! Servidor de alarmes da estação.
//!
//! Accept com poll de espera limitada (o loop observa o shutdown entre
//! iterações, nunca bloqueia indefinidamente) e uma thread por conexão.
//! Thread-per-connection é escolha deliberada de simplicidade: o fan-in
//! esperado é um único relay, poucas conexões no pior caso; sob volume
//! maior, um pool limitado de workers é o upgrade natural.
//!
//! Handlers não compartilham nada além do gate de cooldown sob um único
//! mutex: os dispatches seguem a ordem global de chegada sob o lock; entre
//! conexões concorrentes nenhuma ordem é prometida.

use crate::notify::Notifier;
use sentinel_core::alerts::{CooldownGate, Decision};
use sentinel_core::config::MonitorConfig;
use sentinel_core::protocol::split_alarms;
use sentinel_core::types::AlarmEvent;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Estado compartilhado da estação: uma instância por processo.
pub type SharedGate = Arc<Mutex<CooldownGate>>;

pub struct AlarmServer {
    listener: TcpListener,
    gate: SharedGate,
    notifier: Arc<dyn Notifier>,
    poll_interval: Duration,
    read_buffer_bytes: usize,
}

impl AlarmServer {
    /// Escuta no endpoint configurado. O listener fica não-bloqueante para
    /// o poll do loop de accept.
    pub fn bind(
        cfg: &MonitorConfig,
        gate: SharedGate,
        notifier: Arc<dyn Notifier>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind((cfg.bind_ip.as_str(), cfg.port))?;
        listener.set_nonblocking(true)?;
        info!("🖥️ Estação escutando em {}", listener.local_addr()?);

        Ok(Self {
            listener,
            gate,
            notifier,
            poll_interval: Duration::from_secs_f64(cfg.accept_poll_secs),
            read_buffer_bytes: cfg.read_buffer_bytes,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Loop de accept até o shutdown ser sinalizado.
    pub fn run(&self, shutdown: &AtomicBool) {
        let mut conn_seq = 0u64;

        while !shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    conn_seq += 1;
                    info!("📡 Cliente conectado: {addr}");

                    // O accept herda o modo não-bloqueante em algumas
                    // plataformas; o handler lê bloqueante
                    if let Err(e) = stream.set_nonblocking(false) {
                        warn!("Falha ao configurar stream de {addr}: {e}");
                        continue;
                    }

                    let gate = Arc::clone(&self.gate);
                    let notifier = Arc::clone(&self.notifier);
                    let buffer_bytes = self.read_buffer_bytes;
                    std::thread::Builder::new()
                        .name(format!("alarm-conn-{conn_seq}"))
                        .spawn(move || {
                            handle_connection(stream, addr, gate, notifier, buffer_bytes);
                        })
                        .expect("Falha ao criar thread de conexão");
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    warn!("Erro no accept: {e}");
                    std::thread::sleep(self.poll_interval);
                }
            }
        }

        info!("Loop de accept encerrado");
    }
}

/// Handler de uma conexão: lê chunks até EOF ou erro de leitura, reconstrói
/// registros de alarme e aplica cada um ao gate em ordem de chegada. Ao
/// sair, nenhuma mutação além das já feitas; o stream fecha no drop.
fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    gate: SharedGate,
    notifier: Arc<dyn Notifier>,
    buffer_bytes: usize,
) {
    let mut buf = vec![0u8; buffer_bytes];

    loop {
        match stream.read(&mut buf) {
            Ok(0) => {
                info!("Cliente {addr} encerrou a conexão");
                break;
            }
            Ok(n) => {
                // Cada chunk é reenquadrado isolado dos anteriores, sem
                // buffer entre reads (ver limitação em protocol::split_alarms)
                let text = String::from_utf8_lossy(&buf[..n]);
                for record in split_alarms(&text) {
                    let event = AlarmEvent::new(record.kind, record.text);
                    dispatch(&event, &gate, notifier.as_ref());
                }
            }
            Err(e) => {
                warn!("Erro de leitura de {addr}: {e}");
                break;
            }
        }
    }
}

/// Decide sob o lock compartilhado e despacha ainda sob o lock, para que a
/// ordem global de chegada seja a ordem dos dispatches.
fn dispatch(event: &AlarmEvent, gate: &SharedGate, notifier: &dyn Notifier) {
    let mut gate = gate.lock().expect("gate de cooldown envenenado");

    match gate.decide(event.kind, event.arrival) {
        Decision::Emit(reason) => {
            info!("Dispatch ({reason:?}): {:?} – {}", event.kind, event.raw_text);
            notifier.notify(event);
        }
        Decision::Suppress => {
            debug!("Suprimido (cooldown): {:?} – {}", event.kind, event.raw_text);
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
