#![allow(dead_code)]

use hickory_proto::op::Message;
use hickory_proto::rr::{Record, RecordType};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

use super::builders::a_record;

#[derive(Clone)]
pub enum MockBehavior {
    /// One A record carrying this address for every query.
    Answer(Ipv4Addr),
    /// A response whose id does not match the query.
    WrongId,
    /// Never answers.
    Silent,
    /// One DNS message per entry, streamed over TCP.
    Transfer(Vec<Vec<Record>>),
    /// Like `Answer`, after holding the reply for a while.
    Delayed(Ipv4Addr, Duration),
}

impl MockBehavior {
    fn delay(&self) -> Option<Duration> {
        match self {
            MockBehavior::Delayed(_, delay) => Some(*delay),
            _ => None,
        }
    }
}

/// Backend listening on the same port over UDP and TCP.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(behavior: MockBehavior) -> Self {
        let (listener, socket) = bind_pair().await;
        let addr = listener.local_addr().unwrap();
        let socket = Arc::new(socket);

        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let udp_count = Arc::clone(&udp_queries);
        let tcp_count = Arc::clone(&tcp_queries);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            udp_count.fetch_add(1, Ordering::SeqCst);
                            let responses = respond(&behavior, &buf[..len]);
                            let socket = Arc::clone(&socket);
                            let delay = behavior.delay();
                            tokio::spawn(async move {
                                if let Some(delay) = delay {
                                    tokio::time::sleep(delay).await;
                                }
                                for response in responses {
                                    let _ = socket.send_to(&response, peer).await;
                                }
                            });
                        }
                    }
                    accepted = listener.accept() => {
                        if let Ok((stream, _)) = accepted {
                            tokio::spawn(serve_tcp(stream, behavior.clone(), Arc::clone(&tcp_count)));
                        }
                    }
                }
            }
        });

        Self {
            addr,
            udp_queries,
            tcp_queries,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn backend(&self) -> String {
        self.addr.to_string()
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A TCP port that is also free for UDP.
async fn bind_pair() -> (TcpListener, UdpSocket) {
    for _ in 0..16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        if let Ok(socket) = UdpSocket::bind(addr).await {
            return (listener, socket);
        }
    }
    panic!("no port free for both UDP and TCP");
}

async fn serve_tcp(mut stream: TcpStream, behavior: MockBehavior, count: Arc<AtomicUsize>) {
    loop {
        let mut len_buf = [0u8; 2];
        if stream.read_exact(&mut len_buf).await.is_err() {
            return;
        }
        let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        if stream.read_exact(&mut query).await.is_err() {
            return;
        }
        count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = behavior.delay() {
            tokio::time::sleep(delay).await;
        }
        for response in respond(&behavior, &query) {
            let mut framed = (response.len() as u16).to_be_bytes().to_vec();
            framed.extend_from_slice(&response);
            if stream.write_all(&framed).await.is_err() {
                return;
            }
        }
    }
}

fn respond(behavior: &MockBehavior, query: &[u8]) -> Vec<Vec<u8>> {
    let Ok(request) = Message::from_vec(query) else {
        return vec![];
    };

    match behavior {
        MockBehavior::Silent => vec![],
        MockBehavior::Answer(ip) | MockBehavior::Delayed(ip, _) => {
            let mut response = request.to_response();
            if let Some(question) = request.queries().first() {
                if question.query_type() != RecordType::AXFR {
                    response.add_answer(a_record(&question.name().to_ascii(), *ip));
                }
            }
            vec![response.to_vec().unwrap()]
        }
        MockBehavior::WrongId => {
            let mut response =
                Message::response(request.id().wrapping_add(1), request.op_code());
            response.add_queries(request.queries().to_vec());
            vec![response.to_vec().unwrap()]
        }
        MockBehavior::Transfer(messages) => messages
            .iter()
            .map(|records| {
                let mut response = Message::response(request.id(), request.op_code());
                response.set_authoritative(true);
                response.add_queries(request.queries().to_vec());
                response.add_answers(records.iter().cloned());
                response.to_vec().unwrap()
            })
            .collect(),
    }
}
